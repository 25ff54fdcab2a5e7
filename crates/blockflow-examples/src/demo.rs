//! The demo graph: Counter -> Doubler -> Printer, with the doubled value converted to text.

use blockflow_core::{BlockHandle, Engine, EngineError, Result};

pub struct DemoGraph {
    pub counter: BlockHandle,
    pub doubler: BlockHandle,
    pub printer: BlockHandle,
}

impl DemoGraph {
    pub fn blocks(&self) -> [&BlockHandle; 3] {
        [&self.counter, &self.doubler, &self.printer]
    }
}

pub fn build(engine: &Engine, bundle_path: &str, rate_hz: f64) -> Result<DemoGraph> {
    let bundle = engine.load_bundle(bundle_path)?;
    let counter = bundle.create_block_instance("Counter")?;
    let doubler = bundle.create_block_instance("Doubler")?;
    let printer = bundle.create_block_instance("Printer")?;

    counter.set_update_rate(rate_hz)?;
    if !doubler
        .inlet("number")?
        .link(&counter.outlet("counter")?)?
    {
        return Err(EngineError::TypeMismatch("counter -> number".into()));
    }
    if !printer
        .inlet("text")?
        .link_with_conversion(&doubler.outlet("result")?)?
    {
        return Err(EngineError::TypeMismatch("result -> text".into()));
    }
    printer.inlet("prefix")?.set_value("doubled: ".to_string())?;

    Ok(DemoGraph {
        counter,
        doubler,
        printer,
    })
}

pub fn start(graph: &DemoGraph) -> Result<()> {
    for block in graph.blocks() {
        block.setup()?;
        block.start()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockflow_core::EngineConfig;
    use std::time::Duration;

    #[test]
    fn demo_graph_prints_doubled_values() {
        let engine = blockflow_blocks::new_engine(EngineConfig::default().manual()).unwrap();
        let graph = build(&engine, blockflow_blocks::BASIC_BUNDLE_PATH, 0.0).unwrap();
        assert_eq!(engine.links().len(), 2);
        start(&graph).unwrap();
        for _ in 0..6 {
            engine.step_and_wait(Duration::from_secs(5));
        }
        let line = graph.printer.outlet("line").unwrap().last_value().unwrap();
        assert!(line.value.to_text().starts_with("doubled: "));
    }

    #[test]
    fn exported_demo_imports_into_a_fresh_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let source = blockflow_blocks::new_engine(EngineConfig::default().manual()).unwrap();
        build(&source, blockflow_blocks::BASIC_BUNDLE_PATH, 2.0).unwrap();
        source.save_config(&path).unwrap();

        let target = blockflow_blocks::new_engine(EngineConfig::default().manual()).unwrap();
        target.load_config(&path).unwrap();
        assert_eq!(target.links().len(), 2);
        let names: Vec<String> = target
            .block_instances()
            .iter()
            .filter(|b| !b.is_context().unwrap())
            .map(|b| b.type_name().unwrap())
            .collect();
        assert_eq!(names.len(), 3);
        for expected in ["Counter", "Doubler", "Printer"] {
            assert!(names.iter().any(|n| n == expected));
        }
        let counter = target
            .block_instances()
            .into_iter()
            .find(|b| b.type_name().unwrap() == "Counter")
            .unwrap();
        assert_eq!(counter.policy().unwrap().rate_hz, 2.0);
    }
}
