use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use blockflow_blocks::{BASIC_BUNDLE_PATH, default_loader, new_engine};
use blockflow_core::{
    Block, BlockError, BlockException, BlockIo, BlockMetadata, BlockState, Bundle,
    BundleMetadata, Engine, EngineConfig, EngineError, GraphConfig, InletMetadata, InletPolicy,
    NewBlockData, OutletMetadata, Phase, SharedContext, TimestampedValue,
};

const WAIT: Duration = Duration::from_secs(5);

fn manual_engine() -> Engine {
    new_engine(EngineConfig::default().manual().with_worker_threads(4)).unwrap()
}

fn run(engine: &Engine, ticks: usize) {
    for _ in 0..ticks {
        engine.step();
        assert!(engine.wait_idle(WAIT), "workers did not drain");
    }
}

fn collect_ints(outlet: &blockflow_core::OutletHandle) -> Arc<Mutex<Vec<(i32, u64)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    outlet
        .register_to_new_data(move |v: &TimestampedValue| {
            sink.lock()
                .unwrap()
                .push((v.value.extract::<i32>().unwrap(), v.timestamp));
        })
        .unwrap();
    seen
}

#[test]
fn doubler_follows_counter() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let counter = bundle.create_block_instance("Counter").unwrap();
    let doubler = bundle.create_block_instance("Doubler").unwrap();
    assert_eq!(counter.name().unwrap(), "Counter # 0");
    assert_eq!(doubler.name().unwrap(), "Doubler # 0");

    let linked = doubler
        .inlet("number")
        .unwrap()
        .link(&counter.outlet("counter").unwrap())
        .unwrap();
    assert!(linked);
    let seen = collect_ints(&doubler.outlet("result").unwrap());

    for block in [&counter, &doubler] {
        block.setup().unwrap();
        block.start().unwrap();
    }
    run(&engine, 5);
    counter.stop().unwrap();
    run(&engine, 10);

    let seen = seen.lock().unwrap();
    let values: Vec<i32> = seen.iter().map(|(v, _)| *v).collect();
    assert_eq!(values, vec![2, 4, 6, 8, 10]);
    assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
}

#[test]
fn loading_a_bundle_twice_fails_and_keeps_instances() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let block = bundle.create_block_instance("Doubler").unwrap();

    let err = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(_)), "{err}");
    assert_eq!(engine.bundles().len(), 1);
    assert!(block.is_valid());
    assert_eq!(bundle.block_instances().unwrap(), vec![block]);
}

#[test]
fn unknown_inlet_names_the_block() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let block = bundle.create_block_instance("Doubler").unwrap();
    let err = block.inlet("nope").unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let message = err.to_string();
    assert!(message.contains("Doubler # 0"), "{message}");
    assert!(message.contains("nope"), "{message}");
    assert!(block.inlet("NUMBER").is_ok());
}

#[test]
fn linking_twice_leaves_one_link_and_unlink_removes_it() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let counter = bundle.create_block_instance("Counter").unwrap();
    let doubler = bundle.create_block_instance("Doubler").unwrap();
    let inlet = doubler.inlet("number").unwrap();
    let outlet = counter.outlet("counter").unwrap();

    assert!(inlet.link(&outlet).unwrap());
    assert!(inlet.link(&outlet).unwrap());
    assert_eq!(engine.links().len(), 1);
    assert_eq!(inlet.upstream().unwrap().unwrap().name().unwrap(), "counter");

    inlet.unlink_from(&outlet).unwrap();
    assert!(engine.links().is_empty());
    assert!(inlet.upstream().unwrap().is_none());

    let seen = collect_ints(&doubler.outlet("result").unwrap());
    for block in [&counter, &doubler] {
        block.setup().unwrap();
        block.start().unwrap();
    }
    run(&engine, 3);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn valid_data_policy_waits_for_a_non_default_value() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let doubler = bundle.create_block_instance("Doubler").unwrap();
    doubler
        .update_policy()
        .update_when_inlet_data_valid("number")
        .unwrap();
    let seen = collect_ints(&doubler.outlet("result").unwrap());
    doubler.setup().unwrap();
    doubler.start().unwrap();

    run(&engine, 3);
    assert!(seen.lock().unwrap().is_empty());

    let inlet = doubler.inlet("number").unwrap();
    inlet.set_value(0i32).unwrap();
    run(&engine, 1);
    assert!(seen.lock().unwrap().is_empty());

    inlet.set_value(7i32).unwrap();
    run(&engine, 1);
    assert_eq!(seen.lock().unwrap().first().map(|(v, _)| *v), Some(14));
}

#[test]
fn type_mismatch_needs_conversion() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let counter = bundle.create_block_instance("Counter").unwrap();
    let printer = bundle.create_block_instance("Printer").unwrap();
    let text = printer.inlet("text").unwrap();
    let source = counter.outlet("counter").unwrap();

    assert!(!text.link(&source).unwrap());
    assert!(engine.links().is_empty());
    assert!(text.link_with_conversion(&source).unwrap());
    assert!(engine.links()[0].with_conversion);

    printer.inlet("prefix").unwrap().set_value("n=".to_string()).unwrap();
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    printer
        .outlet("line")
        .unwrap()
        .register_to_new_data(move |v: &TimestampedValue| {
            sink.lock().unwrap().push(v.value.to_text());
        })
        .unwrap();

    for block in [&counter, &printer] {
        block.setup().unwrap();
        block.start().unwrap();
    }
    run(&engine, 2);
    counter.stop().unwrap();
    run(&engine, 4);
    assert_eq!(*lines.lock().unwrap(), vec!["n=1".to_string(), "n=2".to_string()]);
}

#[test]
fn multi_inlet_grows_with_links() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let a = bundle.create_block_instance("Counter").unwrap();
    let b = bundle.create_block_instance("Counter").unwrap();
    assert_eq!(b.name().unwrap(), "Counter # 1");
    let acc = bundle.create_block_instance("Accumulator").unwrap();
    let values = acc.inlet("values").unwrap();

    assert!(values.is_multi_inlet().unwrap());
    assert_eq!(values.size().unwrap(), 0);
    assert!(values.link(&a.outlet("counter").unwrap()).unwrap());
    assert!(values.link(&b.outlet("counter").unwrap()).unwrap());
    assert!(values.link(&b.outlet("counter").unwrap()).unwrap());
    assert_eq!(values.size().unwrap(), 2);
    assert_eq!(values.at(1).unwrap().name().unwrap(), "values[1]");
    assert_eq!(engine.links().len(), 2);

    let sums = Arc::new(Mutex::new(Vec::new()));
    let sink = sums.clone();
    acc.outlet("sum")
        .unwrap()
        .register_to_new_data(move |v: &TimestampedValue| {
            sink.lock().unwrap().push(v.value.extract::<i64>().unwrap());
        })
        .unwrap();

    for block in [&a, &b, &acc] {
        block.setup().unwrap();
        block.start().unwrap();
    }
    run(&engine, 3);
    a.stop().unwrap();
    b.stop().unwrap();
    run(&engine, 6);
    assert_eq!(*sums.lock().unwrap(), vec![2, 4, 6]);

    let first = values.at(0).unwrap();
    values.remove(&first).unwrap();
    assert_eq!(values.size().unwrap(), 1);
    assert_eq!(engine.links().len(), 1);
    let extra = values.add().unwrap();
    assert_eq!(extra.name().unwrap(), "values[2]");
    assert!(values.set_value(1i32).is_err());
}

#[test]
fn block_event_reports_published_outlets() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let acc = bundle.create_block_instance("Accumulator").unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    acc.register_to_new_data(move |data: &NewBlockData| {
        let mut names: Vec<String> = data.iter().map(|(name, _)| name.clone()).collect();
        names.sort();
        sink.lock().unwrap().push(names);
    })
    .unwrap();
    acc.setup().unwrap();
    acc.start().unwrap();
    // No members: nothing blocks the accumulator.
    run(&engine, 2);
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], vec!["inputs".to_string(), "sum".to_string()]);
}

#[test]
fn lifecycle_transitions_are_checked() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let block = bundle.create_block_instance("Counter").unwrap();
    assert_eq!(block.state().unwrap(), BlockState::Created);
    assert!(matches!(block.start(), Err(EngineError::InvalidState(_))));
    assert!(matches!(block.stop(), Err(EngineError::InvalidState(_))));

    block.setup().unwrap();
    block.start().unwrap();
    assert_eq!(block.state().unwrap(), BlockState::Running);
    block.stop().unwrap();
    assert_eq!(block.state().unwrap(), BlockState::Stopped);
    block.start().unwrap();

    block.shutdown().unwrap();
    assert!(!block.is_valid());
    assert!(matches!(block.name(), Err(EngineError::NotFound(_))));
    assert!(bundle.block_instances().unwrap().is_empty());
}

#[test]
fn shutdown_removes_links() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let counter = bundle.create_block_instance("Counter").unwrap();
    let doubler = bundle.create_block_instance("Doubler").unwrap();
    doubler
        .inlet("number")
        .unwrap()
        .link(&counter.outlet("counter").unwrap())
        .unwrap();
    counter.shutdown().unwrap();
    assert!(engine.links().is_empty());
    assert!(doubler.is_valid());
}

#[test]
fn handles_without_engine_are_uninitialized() {
    let handle = blockflow_core::BlockHandle::default();
    assert!(matches!(handle.name(), Err(EngineError::UninitializedHandle(_))));
    assert!(matches!(
        blockflow_core::InletHandle::default().set_value(1i32),
        Err(EngineError::UninitializedHandle(_))
    ));

    let block = {
        let engine = manual_engine();
        let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
        bundle.create_block_instance("Doubler").unwrap()
    };
    assert!(matches!(block.setup(), Err(EngineError::UninitializedHandle(_))));
}

#[test]
fn parameters_take_effect_on_next_update() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let counter = bundle.create_block_instance("Counter").unwrap();
    let step = counter.parameter("step").unwrap();
    step.set_value_from_text("5").unwrap();
    assert_eq!(step.latest().unwrap().to_text(), "5");
    assert!(step.set_value("five".to_string()).is_err());

    let seen = collect_ints(&counter.outlet("counter").unwrap());
    counter.setup().unwrap();
    counter.start().unwrap();
    run(&engine, 2);
    let values: Vec<i32> = seen.lock().unwrap().iter().map(|(v, _)| *v).collect();
    assert_eq!(values, vec![5, 10]);
}

#[test]
fn option_sets_reject_unknown_values() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let clock = bundle.create_block_instance("Clock").unwrap();
    let format = clock.parameter("format").unwrap();
    assert!(format.options().unwrap().is_some());
    assert!(matches!(
        format.set_value("%s".to_string()),
        Err(EngineError::TypeMismatch(_))
    ));
    format.set_value("%+".to_string()).unwrap();
}

#[test]
fn context_block_runs_with_its_bundle() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let context = bundle.context_block().unwrap().unwrap();
    assert_eq!(context.name().unwrap(), "bundle context");
    assert!(context.is_context().unwrap());
    assert_eq!(context.state().unwrap(), BlockState::Running);
    assert_eq!(context.policy().unwrap().rate_hz, 1.0);

    engine.clear_block_instances();
    assert!(context.is_valid());
    engine.clear_fully();
    assert!(!context.is_valid());
    assert!(engine.bundles().is_empty());
}

#[test]
fn graph_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    {
        let engine = manual_engine();
        let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
        let a = bundle.create_block_instance("Counter").unwrap();
        let b = bundle.create_block_instance("Counter").unwrap();
        let acc = bundle.create_block_instance("Accumulator").unwrap();
        a.parameter("step").unwrap().set_value(3i32).unwrap();
        let values = acc.inlet("values").unwrap();
        values.link(&a.outlet("counter").unwrap()).unwrap();
        values.link(&b.outlet("counter").unwrap()).unwrap();
        for block in [&a, &b, &acc] {
            block.setup().unwrap();
        }
        acc.start().unwrap();
        acc.set_update_rate(20.0).unwrap();
        engine.save_config(&path).unwrap();
    }

    let engine = manual_engine();
    engine.load_config(&path).unwrap();
    assert_eq!(engine.bundles().len(), 1);
    assert_eq!(engine.links().len(), 2);

    let a = engine.find_block("Counter # 0").unwrap();
    assert_eq!(a.parameter("step").unwrap().value().unwrap().to_text(), "3");
    assert_eq!(a.state().unwrap(), BlockState::SetUp);
    let acc = engine.find_block("Accumulator # 0").unwrap();
    assert_eq!(acc.state().unwrap(), BlockState::Running);
    assert_eq!(acc.policy().unwrap().rate_hz, 20.0);
    assert_eq!(acc.inlet("values").unwrap().size().unwrap(), 2);

    let exported = engine.export_graph().unwrap();
    assert_eq!(exported.blocks.len(), 3);
    assert_eq!(exported.links.len(), 2);
}

#[test]
fn import_restores_each_lifecycle_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("states.json");
    {
        let engine = manual_engine();
        let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
        bundle.create_block_instance("Counter").unwrap();
        let doubler = bundle.create_block_instance("Doubler").unwrap();
        let printer = bundle.create_block_instance("Printer").unwrap();
        doubler.setup().unwrap();
        printer.setup().unwrap();
        printer.start().unwrap();
        engine.save_config(&path).unwrap();
    }

    let engine = manual_engine();
    engine.load_config(&path).unwrap();
    let state = |name: &str| engine.find_block(name).unwrap().state().unwrap();
    assert_eq!(state("Counter # 0"), BlockState::Created);
    assert_eq!(state("Doubler # 0"), BlockState::SetUp);
    assert_eq!(state("Printer # 0"), BlockState::Running);
}

#[test]
fn failed_import_leaves_the_engine_as_it_was() {
    let graph = GraphConfig::from_json(
        r#"{
            "bundles": [{"name": "Basic", "path": "basic"}],
            "blocks": [
                {"bundle": "Basic", "blockType": "Counter", "name": "Counter # 0", "state": "running"},
                {"bundle": "Basic", "blockType": "Doubler", "name": "Doubler # 0"}
            ],
            "links": [
                {"outletBlock": "Ghost # 0", "outlet": "counter", "inletBlock": "Doubler # 0", "inlet": "number"}
            ]
        }"#,
    )
    .unwrap();

    let engine = manual_engine();
    let err = engine.import_graph(&graph).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(engine.bundles().is_empty());
    assert!(engine.block_instances().is_empty());

    // a bundle that was loaded beforehand stays, only the new blocks go
    engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let before = engine.block_instances().len();
    assert!(engine.import_graph(&graph).is_err());
    assert_eq!(engine.bundles().len(), 1);
    assert_eq!(engine.block_instances().len(), before);
    assert!(engine.links().is_empty());
}

#[test]
fn all_inlet_policy_keeps_declared_triggers() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let printer = bundle.create_block_instance("Printer").unwrap();
    let text = printer.inlet("text").unwrap();
    let prefix = printer.inlet("prefix").unwrap();
    text.set_update_policy(Some(InletPolicy::ValidData)).unwrap();

    printer.update_policy().update_when_all_inlet_data_new().unwrap();
    assert_eq!(prefix.state().unwrap().update_policy, "always");
    assert_eq!(text.state().unwrap().update_policy, "newer timestamp");
}

#[test]
fn multi_inlet_buffer_size_reaches_new_members() {
    let engine = manual_engine();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let acc = bundle.create_block_instance("Accumulator").unwrap();
    let values = acc.inlet("values").unwrap();
    let first = values.add().unwrap();
    values.set_buffer_size(2).unwrap();
    assert_eq!(values.buffer_size().unwrap(), 2);
    assert_eq!(first.buffer_size().unwrap(), 2);
    assert_eq!(values.add().unwrap().buffer_size().unwrap(), 2);
}

#[test]
fn timer_thread_drives_updates() {
    let engine = new_engine(EngineConfig::default().with_worker_threads(2)).unwrap();
    let bundle = engine.load_bundle(BASIC_BUNDLE_PATH).unwrap();
    let counter = bundle.create_block_instance("Counter").unwrap();
    let seen = collect_ints(&counter.outlet("counter").unwrap());
    counter.setup().unwrap();
    counter.start().unwrap();

    let deadline = Instant::now() + WAIT;
    while seen.lock().unwrap().len() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    counter.stop().unwrap();
    let values: Vec<i32> = seen.lock().unwrap().iter().map(|(v, _)| *v).collect();
    assert!(values.len() >= 3);
    assert_eq!(&values[..3], &[1, 2, 3]);
}

// ---- blocks that misbehave ----

struct Misread;

impl Block for Misread {
    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let _: i32 = io.inlet("missing")?;
        Ok(())
    }
}

struct FailingSetup;

impl Block for FailingSetup {
    fn setup(&mut self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        Err("device unavailable".into())
    }

    fn update(&mut self, _io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        Ok(())
    }
}

/// Writes `even` only for even inputs.
struct EvenGate;

impl Block for EvenGate {
    fn update(&mut self, io: &mut BlockIo<'_>) -> Result<(), BlockError> {
        let n: i32 = io.inlet("number")?;
        if n % 2 == 0 {
            io.set_output("even", n)?;
        }
        Ok(())
    }
}

struct TestBundle(BundleMetadata);

impl TestBundle {
    fn new() -> Self {
        let metadata = BundleMetadata::new("Test")
            .with_block(BlockMetadata::new("Misread"))
            .and_then(|m| m.with_block(BlockMetadata::new("FailingSetup")))
            .and_then(|m| {
                m.with_block(
                    BlockMetadata::new("EvenGate")
                        .inlet(InletMetadata::new("number", 0i32))
                        .outlet(OutletMetadata::new("even", 0i32)),
                )
            })
            .unwrap();
        Self(metadata)
    }
}

impl Bundle for TestBundle {
    fn metadata(&self) -> &BundleMetadata {
        &self.0
    }

    fn create_block(
        &self,
        name: &str,
        _context: Option<&SharedContext>,
    ) -> Result<Box<dyn Block>, BlockError> {
        match name {
            "Misread" => Ok(Box::new(Misread)),
            "FailingSetup" => Ok(Box::new(FailingSetup)),
            "EvenGate" => Ok(Box::new(EvenGate)),
            other => Err(format!("unknown block {other}").into()),
        }
    }
}

fn test_engine() -> (Engine, Arc<Mutex<Vec<BlockException>>>) {
    let loader = default_loader().unwrap().with("test", Arc::new(TestBundle::new()));
    let engine = Engine::new(EngineConfig::default().manual().with_worker_threads(2), loader).unwrap();
    let exceptions = Arc::new(Mutex::new(Vec::new()));
    let sink = exceptions.clone();
    engine.register_exception_callback(move |e: &BlockException| sink.lock().unwrap().push(e.clone()));
    (engine, exceptions)
}

#[test]
fn contract_violation_marks_block_unusable() {
    let (engine, exceptions) = test_engine();
    let bundle = engine.load_bundle("test").unwrap();
    let block = bundle.create_block_instance("Misread").unwrap();
    block.setup().unwrap();
    block.start().unwrap();
    run(&engine, 1);

    assert_eq!(block.state().unwrap(), BlockState::Unusable);
    {
        let exceptions = exceptions.lock().unwrap();
        assert_eq!(exceptions.len(), 1);
        assert_eq!(exceptions[0].phase, Phase::Update);
        assert_eq!(exceptions[0].block_name, "Misread # 0");
        assert!(exceptions[0].error.is_contract_violation());
    }
    run(&engine, 2);
    assert_eq!(exceptions.lock().unwrap().len(), 1);

    block.setup().unwrap();
    assert_eq!(block.state().unwrap(), BlockState::SetUp);
}

#[test]
fn failing_setup_is_reported_not_returned() {
    let (engine, exceptions) = test_engine();
    let bundle = engine.load_bundle("test").unwrap();
    let block = bundle.create_block_instance("FailingSetup").unwrap();
    block.setup().unwrap();
    assert_eq!(block.state().unwrap(), BlockState::SetupFailed);
    assert!(matches!(block.start(), Err(EngineError::InvalidState(_))));
    let exceptions = exceptions.lock().unwrap();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].phase, Phase::Setup);
    assert!(exceptions[0].to_string().contains("device unavailable"));
}

#[test]
fn unwritten_outlets_do_not_publish() {
    let (engine, _) = test_engine();
    let bundle = engine.load_bundle("test").unwrap();
    let gate = bundle.create_block_instance("EvenGate").unwrap();
    let seen = collect_ints(&gate.outlet("even").unwrap());
    let events = Arc::new(AtomicUsize::new(0));
    let counted = events.clone();
    gate.register_to_new_data(move |_: &NewBlockData| {
        counted.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    gate.setup().unwrap();
    gate.start().unwrap();

    let number = gate.inlet("number").unwrap();
    for n in 1..=4 {
        number.set_value(n).unwrap();
        run(&engine, 1);
    }
    let values: Vec<i32> = seen.lock().unwrap().iter().map(|(v, _)| *v).collect();
    assert_eq!(values, vec![2, 4]);
    assert_eq!(events.load(Ordering::SeqCst), 2);
    assert_eq!(gate.outlet("even").unwrap().last_value().unwrap().value.to_text(), "4");
}

#[test]
fn unknown_bundle_is_not_found() {
    let engine = manual_engine();
    assert!(matches!(engine.load_bundle("nowhere"), Err(EngineError::NotFound(_))));
    let bundle = engine.load_bundle("plugins/basic.so").unwrap();
    assert!(matches!(
        bundle.create_block_instance("Teleporter"),
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(engine.find_bundle_by_name("basic").unwrap().name().unwrap(), "Basic");
}
