use cucumber::given;

use crate::cucumber::{loyalty_world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user '{word}'")]
async fn a_user(world: &mut LoyaltyWorld, login: String) {
    world.system_mut().create_user(&login).await;
}
