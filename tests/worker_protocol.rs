use dla_worker::{Command, Event, Particle, SettingsUpdate, SimulationConfig, SimulationWorker};
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(30);

fn config(base_adhesion: f64) -> SimulationConfig {
    let mut config = SimulationConfig {
        steps_per_batch: 5_000,
        rng_seed: Some(2024),
        ..Default::default()
    };
    config.settings.base_adhesion = base_adhesion;
    config
}

fn next(worker: &SimulationWorker) -> Event {
    worker
        .events()
        .recv_timeout(TIMEOUT)
        .expect("worker went quiet")
}

fn is_seed(event: &Event) -> bool {
    let Event::Particles { data, stats } = event;
    data.len() == 1
        && data[0]
            == Particle {
                x: 0.0,
                y: 0.0,
                index: 0,
            }
        && stats.stuck_count == 1
        && stats.max_radius == 0.0
}

#[test]
fn test_start_stop_reset_over_channels() {
    let worker = SimulationWorker::spawn(&config(1.0)).unwrap();
    assert!(is_seed(&next(&worker)));

    assert!(worker.send(Command::Start));
    // Duplicate starts are no-ops
    assert!(worker.send(Command::Start));

    let mut expected_index = 1;
    let mut last_radius = 0.0;
    let deadline = Instant::now() + TIMEOUT;
    while expected_index < 20 {
        assert!(Instant::now() < deadline, "too slow to grow");
        let Event::Particles { data, stats } = next(&worker);
        assert!(!data.is_empty());
        for particle in &data {
            assert_eq!(particle.index, expected_index);
            expected_index += 1;
        }
        assert_eq!(stats.stuck_count, expected_index);
        assert!(stats.max_radius >= last_radius);
        last_radius = stats.max_radius;
    }

    assert!(worker.send(Command::Stop));
    assert!(worker.send(Command::Reset));

    // Batches already in flight keep their order, then the seed arrives
    loop {
        let event = next(&worker);
        if is_seed(&event) {
            break;
        }
        let Event::Particles { data, .. } = event;
        for particle in &data {
            assert_eq!(particle.index, expected_index);
            expected_index += 1;
        }
    }

    // Stopped after reset: nothing more is produced
    assert!(worker.recv_timeout(Duration::from_millis(300)).is_err());
    worker.shutdown();
}

#[test]
fn test_settings_update_takes_effect() {
    let worker = SimulationWorker::spawn(&config(0.0)).unwrap();
    assert!(is_seed(&next(&worker)));

    worker.send(Command::Start);
    assert!(worker.recv_timeout(Duration::from_millis(300)).is_err());

    worker.send(Command::update_settings(SettingsUpdate::base_adhesion(1.0)));
    let Event::Particles { data, .. } = next(&worker);
    assert_eq!(data[0].index, 1);

    worker.send(Command::Stop);
    worker.shutdown();
}

#[test]
fn test_drop_joins_running_worker() {
    let worker = SimulationWorker::spawn(&config(0.35)).unwrap();
    worker.send(Command::Start);
    assert!(is_seed(&next(&worker)));
    drop(worker);
}

#[test]
fn test_reported_particles_normalize_into_unit_square() {
    let worker = SimulationWorker::spawn(&config(1.0)).unwrap();
    assert!(is_seed(&next(&worker)));
    worker.send(Command::Start);

    let mut seen = 0;
    while seen < 30 {
        let Event::Particles { data, stats } = next(&worker);
        for particle in &data {
            // Every reported particle lies within the extent reported with it
            let pos = stats.normalize(particle);
            assert!((0.0..=1.0).contains(&pos.x), "x {}", pos.x);
            assert!((0.0..=1.0).contains(&pos.y), "y {}", pos.y);
            assert!((0.0..=1.0).contains(&pos.distance));
        }
        seen += data.len();
    }

    worker.send(Command::Stop);
    worker.shutdown();
}
