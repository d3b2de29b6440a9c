mod oven;

use oven::oven_controller::OvenController;
use oven::oven_events::OvenEvent;
use oven::oven_states::PREHEAT_DELAY_TICKS;
use oven::oven_timer::TICK;

#[tokio::main]
async fn main() {
    let oven = OvenController::spawn();

    // Starts closed/off (the history field's default before any ENTRY has
    // recorded anything).
    let snapshot = oven.snapshot().await;
    assert!(snapshot.is_off);

    println!("Turning the oven on");
    oven.dispatch(OvenEvent::TurnOn).await;
    let snapshot = oven.snapshot().await;
    assert!(snapshot.is_on);
    println!("on-ENTRY trace: {}", snapshot.trace);
    assert!(!snapshot.preheated, "pre-heat should not finish before the delay elapses");

    println!("Opening the door mid pre-heat");
    oven.dispatch(OvenEvent::Open).await;

    println!("Closing the door again — history should re-enter `on`");
    oven.dispatch(OvenEvent::Close).await;
    let snapshot = oven.snapshot().await;
    assert!(snapshot.is_on, "closing the door should restore the last active sub-state");

    // Give the `Delay` node's timer enough wall-clock time to fire and
    // advance the pre-heat sequence past `Delay` into `preheat_wait`.
    tokio::time::sleep(TICK * (PREHEAT_DELAY_TICKS + 1)).await;
    let snapshot = oven.snapshot().await;
    println!("post-delay trace: {}", snapshot.trace);

    // Turning it off and back on again transitions out of `preheat_wait`
    // (several levels inside the BT subtree) and back into a fresh
    // pre-heat cycle, exercising a transition whose source is deep in the
    // active branch and whose target is a sibling of `on` under `closed`.
    oven.dispatch(OvenEvent::TurnOff).await;
    oven.dispatch(OvenEvent::TurnOn).await;

    let snapshot = oven.snapshot().await;
    println!("final trace: {}", snapshot.trace);
}
