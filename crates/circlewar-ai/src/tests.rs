#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::steering::{home_cone_half_angle, ramp_speed, seek, wander_heading};
    use crate::strategy::{AiContext, AiStrategy};

    fn ctx(position: Vec2, target: Option<Vec2>) -> AiContext {
        AiContext {
            position,
            velocity: Vec2::ZERO,
            max_speed: 4.0,
            target,
            dt: 1.0 / 60.0,
        }
    }

    fn angle_diff(a: f32, b: f32) -> f32 {
        circlewar_core::types::normalize_angle(a - b).abs()
    }

    #[test]
    fn test_seek_has_requested_speed() {
        let v = seek(Vec2::ZERO, Vec2::new(3.0, 4.0), 10.0);
        assert!((v - Vec2::new(6.0, 8.0)).length() < 1e-4);
        assert_eq!(seek(Vec2::ONE, Vec2::ONE, 10.0), Vec2::ZERO);
    }

    #[test]
    fn test_follow_moves_at_max_speed_and_faces_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ai = AiStrategy::follow();
        let update = ai.update(&ctx(Vec2::ZERO, Some(Vec2::new(0.0, 100.0))), &mut rng);
        assert!((update.velocity - Vec2::new(0.0, 4.0)).length() < 1e-4);
        assert!((update.facing_angle.unwrap() - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_follow_without_target_stops() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ai = AiStrategy::follow();
        let update = ai.update(&ctx(Vec2::ZERO, None), &mut rng);
        assert_eq!(update.velocity, Vec2::ZERO);
        assert_eq!(update.facing_angle, None);
    }

    #[test]
    fn test_stalk_ramps_speed_with_distance() {
        assert!((ramp_speed(10.0, 1.0, 4.0, 50.0, 150.0) - 1.0).abs() < 1e-6);
        assert!((ramp_speed(100.0, 1.0, 4.0, 50.0, 150.0) - 2.5).abs() < 1e-6);
        assert!((ramp_speed(500.0, 1.0, 4.0, 50.0, 150.0) - 4.0).abs() < 1e-6);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ai = AiStrategy::stalk(1.0, 50.0, 150.0);
        let near = ai.update(&ctx(Vec2::ZERO, Some(Vec2::new(20.0, 0.0))), &mut rng);
        let far = ai.update(&ctx(Vec2::ZERO, Some(Vec2::new(400.0, 0.0))), &mut rng);
        assert!((near.velocity.length() - 1.0).abs() < 1e-4);
        assert!((far.velocity.length() - 4.0).abs() < 1e-4);
        assert!(far.velocity.x > 0.0);
    }

    #[test]
    fn test_home_cone() {
        assert_eq!(home_cone_half_angle(Vec2::ZERO, Vec2::ZERO, 10.0), None);
        let half = home_cone_half_angle(Vec2::new(20.0, 0.0), Vec2::ZERO, 10.0).unwrap();
        assert!((half - PI / 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_wander_outside_radius_heads_home() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let position = Vec2::new(200.0, 0.0);
        let half = home_cone_half_angle(position, Vec2::ZERO, 50.0).unwrap();
        for _ in 0..200 {
            let heading = wander_heading(position, Vec2::ZERO, 50.0, &mut rng);
            assert!(angle_diff(heading, PI) <= half + 1e-4, "heading {heading}");
        }
    }

    #[test]
    fn test_wander_changes_heading_on_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut ai = AiStrategy::wander(Vec2::ZERO, 100.0);
        let context = ctx(Vec2::new(10.0, 10.0), None);

        let first = ai.update(&context, &mut rng);
        assert!(first.acceleration.length() > 0.0);
        let timer = match &ai {
            AiStrategy::Wander(w) => w.timer,
            _ => unreachable!(),
        };
        assert!(timer >= 0.5 && timer <= 2.0);

        // Within the interval the acceleration holds.
        let second = ai.update(&context, &mut rng);
        assert_eq!(first.acceleration, second.acceleration);
        assert_eq!(second.velocity, context.velocity);
    }

    #[test]
    fn test_same_seed_same_wander() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ai = AiStrategy::wander(Vec2::ZERO, 100.0);
            (0..300)
                .map(|_| ai.update(&ctx(Vec2::new(150.0, 0.0), None), &mut rng).acceleration)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn test_strategy_serde() {
        let strategies = vec![
            AiStrategy::follow(),
            AiStrategy::stalk(1.0, 50.0, 200.0),
            AiStrategy::wander(Vec2::new(1.0, 2.0), 30.0),
        ];
        for s in strategies {
            let json = serde_json::to_string(&s).unwrap();
            let back: AiStrategy = serde_json::from_str(&json).unwrap();
            assert_eq!(s, back);
        }
    }
}
