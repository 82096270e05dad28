use cucumber::given;

use crate::cucumber::{world::PayoutSystem, PayoutWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut PayoutWorld) {
    let system = PayoutSystem::new().await;
    world.system = Some(system);
}
