use stagemu::controller::{config::ControllerConfig, Controller};
use std::time::Duration;

fn controller() -> Controller {
    Controller::new(ControllerConfig::default()).unwrap()
}

async fn ready_controller() -> Controller {
    let controller = controller();
    controller.request("E:").await;
    controller.request("HA:").await;
    controller
}

#[tokio::test(start_paused = true)]
async fn enable_then_home_single_axis() {
    let controller = controller();
    controller.request("E:").await;
    controller.request("H:1:").await;
    assert_eq!(controller.request("?R:1:").await, "#1;Ready;0;um");

    // other axes stay unreferenced
    assert_eq!(controller.request("?R:6:").await, "#6;NoHome;0;mgrad");
}

#[tokio::test(start_paused = true)]
async fn homing_uses_profile_offset() {
    let controller = ready_controller().await;
    assert_eq!(controller.request("?P:5:").await, "-15000");
    assert_eq!(controller.request("?P:6:").await, "-21000");
}

#[tokio::test(start_paused = true)]
async fn speed_above_limit_is_ignored() {
    let controller = ready_controller().await;
    assert_eq!(controller.request("V:1:2000:").await, "");
    assert_eq!(controller.request("?V:1:").await, "375");

    assert_eq!(controller.request("V:1:1874.5:?V:1:").await, "1874.5");
}

#[tokio::test(start_paused = true)]
async fn speed_round_trips_for_valid_values() {
    let controller = ready_controller().await;
    for (axis, speed) in [(1, "0.5"), (4, "3749"), (5, "650"), (6, "12.25")] {
        let reply = controller
            .request(&format!("V:{}:{}:?V:{}:", axis, speed, axis))
            .await;
        assert_eq!(reply, speed);
    }
}

#[tokio::test(start_paused = true)]
async fn relative_move_runs_to_completion() {
    let controller = ready_controller().await;
    let start: f64 = controller.request("?P:2:").await.parse().unwrap();

    controller.request("MR:2:10856.3:").await;
    assert_eq!(controller.request("?S:2:").await, "Moving");
    assert_eq!(controller.request("?M:2:").await, "1");

    tokio::time::sleep(Duration::from_secs(40)).await;

    assert_eq!(controller.request("?M:2:").await, "0");
    let end: f64 = controller.request("?P:2:").await.parse().unwrap();
    assert_eq!(end, start + 10856.3);
}

#[tokio::test(start_paused = true)]
async fn stop_freezes_position_short_of_target() {
    let controller = ready_controller().await;
    controller.request("MR:2:10856.3:").await;
    tokio::time::sleep(Duration::from_millis(2500)).await;
    controller.request("S:2:").await;

    assert_eq!(controller.request("?S:2:").await, "Ready");
    let stopped: f64 = controller.request("?P:2:").await.parse().unwrap();
    assert!(stopped > 0.0 && stopped < 10856.3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let later: f64 = controller.request("?P:2:").await.parse().unwrap();
    assert_eq!(later, stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_all_halts_every_moving_axis() {
    let controller = ready_controller().await;
    controller.request("MA:1:20000:MA:4:90000:").await;
    assert_eq!(controller.request("?M:1:?M:4:?M:2:").await, "110");

    controller.request("SA:").await;
    assert_eq!(controller.request("?M:1:?M:4:").await, "00");
}

#[tokio::test(start_paused = true)]
async fn out_of_range_moves_never_start() {
    let controller = ready_controller().await;
    let before = controller.request("?RA:").await;

    controller.request("MR:1:-0.1:MA:5:15000.5:MR:6:42001:").await;

    assert_eq!(controller.request("?RA:").await, before);
    assert_eq!(controller.request("?M:1:?M:5:?M:6:").await, "000");
}

#[tokio::test(start_paused = true)]
async fn absolute_move_with_custom_parameters() {
    let controller = ready_controller().await;
    controller.request("V:5:650:A:5:1.5:MA:5:-5000:").await;
    assert_eq!(controller.request("?V:5:?A:5:").await, "6501.5");

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(controller.request("?R:5:").await, "#5;Ready;-5000;mgrad");
}

#[tokio::test(start_paused = true)]
async fn sync_relative_infeasible_batch_changes_nothing() {
    let controller = ready_controller().await;
    let before = controller.request("?RA:").await;
    let speeds = controller.request("?V:1:?V:3:?V:6:").await;

    // axis 3 would end at -40.5, below its travel
    controller
        .request("SYNCR:100:0:-40.5:0:0:1000.6:6:0.5:")
        .await;

    assert_eq!(controller.request("?RA:").await, before);
    assert_eq!(controller.request("?V:1:?V:3:?V:6:").await, speeds);
}

#[tokio::test(start_paused = true)]
async fn sync_relative_moves_axes_together() {
    let controller = ready_controller().await;
    controller
        .request("SYNCR:100:0:40.5:0:0:1000.6:6:0.5:")
        .await;
    assert_eq!(controller.request("?M:1:?M:2:?M:3:?M:6:").await, "1011");
    assert_eq!(controller.request("?A:1:?A:2:").await, "0.51");

    tokio::time::sleep(Duration::from_secs(8)).await;

    assert_eq!(controller.request("?P:1:").await, "100");
    assert_eq!(controller.request("?P:3:").await, "40.5");
    let gonio: f64 = controller.request("?P:6:").await.parse().unwrap();
    assert_eq!(gonio, -21000.0 + 1000.6);
    assert_eq!(controller.request("?M:1:?M:3:?M:6:").await, "000");
}

#[tokio::test(start_paused = true)]
async fn sync_absolute_only_moves_axes_off_target() {
    let controller = ready_controller().await;
    controller.request("SYNCA:0:0:0:0:0:0:20:0.5:").await;

    // only axes 5 and 6 sit away from zero after homing
    assert_eq!(
        controller.request("?M:1:?M:2:?M:3:?M:4:?M:5:?M:6:").await,
        "000011"
    );

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(controller.request("?P:5:?P:6:").await, "00");
}

#[tokio::test(start_paused = true)]
async fn sync_absolute_infeasible_batch_changes_nothing() {
    let controller = ready_controller().await;
    let before = controller.request("?RA:").await;
    let parameters = controller.request("?V:5:?A:5:?V:6:?A:6:").await;

    // axis 6 could reach 0, but 99999 is past the end of axis 5
    assert_eq!(controller.request("SYNCA:0:0:0:0:99999:0:5:0.5:").await, "");

    assert_eq!(controller.request("?M:5:?M:6:").await, "00");
    assert_eq!(controller.request("?V:5:?A:5:?V:6:?A:6:").await, parameters);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(controller.request("?RA:").await, before);
}

#[tokio::test(start_paused = true)]
async fn malformed_batches_return_error() {
    let controller = ready_controller().await;
    for text in [
        "?R:0:",
        "?R:7:",
        "?V:x:",
        "MA:1:abc:",
        "V:1:",
        "SYNCR:1:2:3:",
        "?P:1:?P:99:",
    ] {
        assert_eq!(controller.request(text).await, "Error", "batch {:?}", text);
    }
}

#[tokio::test(start_paused = true)]
async fn unterminated_and_unknown_tokens_are_ignored() {
    let controller = ready_controller().await;
    assert_eq!(controller.request("?S:1:?S").await, "Ready");
    assert_eq!(controller.request("XYZ:?S:1:").await, "Ready");
    // the axis id after the last delimiter is not a token
    assert_eq!(controller.request("?S:1").await, "Error");
    assert_eq!(controller.request("").await, "");
}

#[tokio::test(start_paused = true)]
async fn token_cap_truncates_long_batches() {
    let controller = ready_controller().await;
    // 8 queries need 16 tokens; the ninth is cut off
    let batch = "?M:1:".repeat(9);
    assert_eq!(controller.request(&batch).await, "00000000");
}

#[tokio::test(start_paused = true)]
async fn disable_then_reenable_requires_homing() {
    let controller = ready_controller().await;
    controller.request("D:E:").await;
    assert_eq!(controller.request("?S:1:").await, "NoHome");
    assert_eq!(controller.request("MA:1:100:?S:1:").await, "NoHome");
}
