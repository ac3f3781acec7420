use serde_json::Value;
use treeops_core::store::fixtures;
use treeops_core::{ContainerId, Engine, EngineConfig, MemoryStore};

/// Create a store holding `json` under the root name "src"
#[allow(dead_code)]
pub fn store_with(json: &Value) -> (MemoryStore, ContainerId) {
    let mut store = MemoryStore::new();
    let src = fixtures::load_json(&mut store, "src", json).unwrap();
    (store, src)
}

/// Bind a fresh empty root under `name`
#[allow(dead_code)]
pub fn empty_root(store: &mut MemoryStore, name: &str) -> ContainerId {
    store.new_root(name).unwrap()
}

/// Render a container as JSON
#[allow(dead_code)]
pub fn render(store: &mut MemoryStore, container: ContainerId) -> Value {
    fixtures::to_json(store, container).unwrap()
}

/// Engine whose worklist refuses to hold more than `max` items
#[allow(dead_code)]
pub fn bounded_engine(max: usize) -> Engine {
    Engine::new(EngineConfig {
        max_work_items: Some(max),
        ..EngineConfig::default()
    })
    .unwrap()
}

/// Build a chain `{"n": {"n": ... {"leaf": depth}}}` nested `depth` levels deep
#[allow(dead_code)]
pub fn deep_chain(depth: usize) -> Value {
    let mut node = serde_json::json!({ "leaf": depth });
    for _ in 0..depth {
        node = serde_json::json!({ "n": node });
    }
    node
}
