#![no_main]

//! Fuzz target for container operations
//!
//! Registers entries under a small pool of names, wires factories to
//! arbitrary dependencies (including themselves) and checks that
//! resolution either succeeds or fails with a typed error.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use named_injector::{Container, DiError, State, Value, declare};

const NAMES: [&str; 6] = ["A", "B", "C", "D", "Sub/A", "Container"];

fn name(index: u8) -> &'static str {
    NAMES[index as usize % NAMES.len()]
}

/// Operations to perform on the container
#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Value(u8, u32),
    Constant(u8, u32),
    Factory { name: u8, dependencies: Vec<u8> },
    Decorate(u8),
    Config(Vec<u8>),
    Import { prefixed: bool },
    Boot,
    Get(u8),
    TryGet(u8),
    Contains(u8),
    Remove(u8),
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();
    let other = Container::new();
    other.value("A", 1u32);

    for op in ops {
        match op {
            ContainerOp::Value(index, value) => {
                container.value(name(index), value);
            }
            ContainerOp::Constant(index, value) => {
                container.constant(name(index), value);
            }
            ContainerOp::Factory { name: index, dependencies } => {
                let dependencies: Vec<String> =
                    dependencies.into_iter().map(|dep| name(dep).to_owned()).collect();
                container.factory(
                    name(index),
                    named_injector::Declaration::new(
                        dependencies,
                        named_injector::Function::new(|args| Ok(Value::new(args.len() as u32))),
                    ),
                );
            }
            ContainerOp::Decorate(index) => {
                let _ = container.decorator(
                    name(index),
                    declare!["DecoratedInstance" => fn |args| Ok(args.value(0)?.clone())],
                );
            }
            ContainerOp::Config(dependencies) => {
                let dependencies: Vec<String> = dependencies
                    .into_iter()
                    .map(|dep| format!("{}Provider", name(dep)))
                    .collect();
                container.config(named_injector::Declaration::new(
                    dependencies,
                    named_injector::Function::new(|_| Ok(Value::null())),
                ));
            }
            ContainerOp::Import { prefixed } => {
                let prefix = prefixed.then_some("Sub");
                let _ = container.import(&other, prefix);
            }
            ContainerOp::Boot => {
                if container.boot().is_ok() {
                    assert_eq!(container.state(), State::Booted);
                }
            }
            ContainerOp::Get(index) => match container.get(name(index)) {
                Ok(_)
                | Err(DiError::DependencyNotFound { .. })
                | Err(DiError::RingDependency { .. }) => {}
                Err(err) => panic!("unexpected error: {err}"),
            },
            ContainerOp::TryGet(index) => {
                let _ = container.try_get(name(index));
            }
            ContainerOp::Contains(index) => {
                let _ = container.contains(name(index));
            }
            ContainerOp::Remove(index) => {
                assert!(matches!(
                    container.remove(name(index)),
                    Err(DiError::NotImplemented { .. })
                ));
            }
        }
    }
});
