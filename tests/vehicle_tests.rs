mod common;

use tokio::sync::broadcast;
use tollbot::config::{Config, Scene};
use tollbot::controller::VehicleController;
use tollbot::drive::Key;
use tollbot::math::Vec3;
use tollbot::node::Node;
use tollbot::report::reporter::Delivery;
use tollbot::report::StartFix;
use tollbot::world::{KinematicWorld, Robot};

const FIX: StartFix = StartFix {
    lat: 12.9712,
    lon: 77.5949,
    total_distance_km: 28.3,
};

/// One metre per second straight at the sign, 5 cm per tick.
fn config(api_url: String, start_x: f64, held_key: Option<Key>) -> Config {
    let mut config = Config::default();
    config.vehicle.forward_speed = 3.6;
    config.report.api_url = api_url;
    config.report.timeout_s = 2;
    config.simulation.scene = Scene {
        vehicle_start: Vec3::new(start_x, 0.3, 0.0),
        held_key,
        ..Scene::default()
    };
    config
}

fn world(config: &Config, max_steps: Option<u64>) -> KinematicWorld {
    KinematicWorld::from_scene(&config.simulation.scene, max_steps)
}

#[tokio::test]
async fn reports_once_on_first_crossing() {
    let (url, seen) = common::spawn_stub(|_| (200, "{}".to_owned())).await;
    let config = config(url, 110.0, Some(Key::Up));
    let (_tx, rx) = broadcast::channel(1);
    let mut vehicle =
        VehicleController::create(&config, world(&config, None), FIX, rx).unwrap();

    let mut fired_at = Vec::new();
    for tick in 0..300 {
        vehicle.world_mut().step(50).await.unwrap();
        let payload = vehicle.tick().await.unwrap();
        let offset = (vehicle.world().vehicle_position().x - config.vehicle.sign_x).abs();

        match payload {
            Some(payload) => {
                assert!(offset <= 0.1, "fired {} m away", offset);
                assert_eq!(payload.device_id, config.device.id);
                assert_eq!(payload.start_lat, FIX.lat);
                assert_eq!(payload.total_distance_km, FIX.total_distance_km);
                fired_at.push(tick);
            }
            None if fired_at.is_empty() => assert!(offset > 0.1),
            None => {}
        }
    }

    assert_eq!(fired_at.len(), 1);
    assert!(vehicle.has_reported());
    // The vehicle kept driving well past the sign.
    assert!(vehicle.world().vehicle_position().x > 120.0);

    let delivery = vehicle.take_dispatch().unwrap().await.unwrap();
    assert!(matches!(delivery, Delivery::Accepted { status: 200, .. }));
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(vehicle.take_dispatch().is_none());
}

#[tokio::test]
async fn stays_silent_away_from_the_sign() {
    let config = config(common::refused_url().await, 100.0, None);
    let (_tx, rx) = broadcast::channel(1);
    let mut vehicle =
        VehicleController::create(&config, world(&config, Some(100)), FIX, rx).unwrap();

    vehicle.run().await.unwrap();

    assert!(!vehicle.has_reported());
    assert!(vehicle.take_dispatch().is_none());
    assert_eq!(vehicle.world().steps(), 100);
    assert_eq!(vehicle.world().vehicle_position().x, 100.0);
    assert_eq!(vehicle.odometer_m(), 0.0);
}

#[tokio::test]
async fn parked_on_the_sign_fires_without_input() {
    let (url, seen) = common::spawn_stub(|_| (200, "{}".to_owned())).await;
    let config = config(url, 115.92, None);
    let (_tx, rx) = broadcast::channel(1);
    let mut vehicle =
        VehicleController::create(&config, world(&config, Some(40)), FIX, rx).unwrap();

    vehicle.world_mut().step(50).await.unwrap();
    assert!(vehicle.tick().await.unwrap().is_some());

    vehicle.run().await.unwrap();
    vehicle.take_dispatch().unwrap().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn keys_steer_the_vehicle() {
    let config = config(common::refused_url().await, 0.0, None);
    let script = vec![
        vec![Key::Up.code()],
        vec![Key::Up.code(), Key::Right.code()],
        vec![],
        vec![Key::Down.code(), 42],
    ];
    let world = world(&config, None).with_key_script(script);
    let (_tx, rx) = broadcast::channel(1);
    let mut vehicle = VehicleController::create(&config, world, FIX, rx).unwrap();

    let expected = [(3.6, 0.0), (0.0, 0.3), (0.0, 0.0), (-3.6, 0.0)];
    for (speed, steering) in expected {
        vehicle.world_mut().step(50).await.unwrap();
        vehicle.tick().await.unwrap();
        assert_eq!(vehicle.world().cruising_speed(), speed);
        assert_eq!(vehicle.world().steering_angle(), steering);
    }
}

#[tokio::test]
async fn network_failure_does_not_stop_the_loop() {
    let config = config(common::refused_url().await, 115.0, Some(Key::Up));
    let (_tx, rx) = broadcast::channel(1);
    let mut vehicle =
        VehicleController::create(&config, world(&config, Some(200)), FIX, rx).unwrap();

    vehicle.run().await.unwrap();

    assert!(vehicle.has_reported());
    assert_eq!(vehicle.world().steps(), 200);
    let delivery = vehicle.take_dispatch().unwrap().await.unwrap();
    assert!(matches!(delivery, Delivery::Failed { .. }));
}

#[tokio::test]
async fn drop_signal_stops_before_stepping() {
    let config = config(common::refused_url().await, 0.0, Some(Key::Up));
    let (tx, rx) = broadcast::channel(1);
    let mut vehicle =
        VehicleController::create(&config, world(&config, None), FIX, rx).unwrap();

    tx.send(()).unwrap();
    vehicle.run().await.unwrap();

    assert_eq!(vehicle.world().steps(), 0);
}

#[tokio::test]
async fn odometer_tracks_the_driven_distance() {
    let config = config(common::refused_url().await, 0.0, Some(Key::Up));
    let (_tx, rx) = broadcast::channel(1);
    let mut vehicle =
        VehicleController::create(&config, world(&config, Some(41)), FIX, rx).unwrap();

    vehicle.run().await.unwrap();

    // First tick only sets the speed; the next 40 cover 5 cm each.
    assert!((vehicle.odometer_m() - 2.0).abs() < 1e-9);
}
