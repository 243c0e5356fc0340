mod common;

use proptest::prelude::*;

use common::fixtures::{pose_for, push_up_set, squat_pose, squat_set};
use rep_motion::motion::config::SeverityBand;
use rep_motion::motion::monitoring::check_summary;
use rep_motion::motion::scoring::classify;
use rep_motion::motion::smoother::PoseSmoother;
use rep_motion::motion::types::{CheckName, FrameInput, Joint, Severity};
use rep_motion::motion::{ExerciseKind, MotionConfig, MotionEngine};

proptest! {
    #[test]
    fn pt_smoothing_converges_to_constant_input(
        alpha in 0.05_f64..1.0,
        start in 0.0_f64..1.0,
        target in 0.0_f64..1.0,
        steps in 1_usize..40,
    ) {
        let mut smoother = PoseSmoother::new(alpha);
        smoother.smooth(&FrameInput::planar(squat_pose(start), 0.9));

        let raw = squat_pose(target);
        let initial_gap = (squat_pose(start)[Joint::LeftKnee].y - raw[Joint::LeftKnee].y).abs();
        let mut last = None;
        for _ in 0..steps {
            last = Some(smoother.smooth(&FrameInput::planar(raw, 0.9)));
        }
        let frame = last.expect("at least one step");
        let gap = (frame.pose.joint(Joint::LeftKnee).y - raw[Joint::LeftKnee].y).abs();
        prop_assert!(gap <= initial_gap * (1.0 - alpha).powi(steps as i32) + 1e-9);
    }

    #[test]
    fn pt_frame_index_is_monotonic(depths in prop::collection::vec(0.0_f64..1.0, 1..150)) {
        let mut engine = MotionEngine::new(MotionConfig::default());
        for (i, depth) in depths.iter().enumerate() {
            let outcome = engine.process_frame(&FrameInput::planar(squat_pose(*depth), 0.8));
            prop_assert_eq!(outcome.frame.frame_index, i as u64 + 1);
        }
        prop_assert_eq!(engine.stats().frames_processed, depths.len() as u64);
    }

    #[test]
    fn pt_sub_threshold_noise_never_counts(
        noise in prop::collection::vec(0.0_f64..0.05, 50..400),
        confidence in 0.0_f64..1.0,
    ) {
        let mut engine = MotionEngine::new(MotionConfig::for_exercise(ExerciseKind::Squat));
        for depth in &noise {
            let outcome = engine.process_frame(&FrameInput::planar(squat_pose(*depth), confidence));
            prop_assert!(outcome.rep.is_none());
        }
        prop_assert_eq!(engine.rep_count(), 0);
    }

    #[test]
    fn pt_status_follows_severity(
        exercise in prop_oneof![Just(ExerciseKind::Squat), Just(ExerciseKind::PushUp)],
        depths in prop::collection::vec(0.0_f64..1.0, 3..200),
    ) {
        let mut engine = MotionEngine::new(MotionConfig::for_exercise(exercise));
        for depth in &depths {
            let outcome = engine.process_frame(&FrameInput::planar(pose_for(exercise, *depth), 0.9));
            let names: Vec<CheckName> = outcome.live_checks.iter().map(|(name, _)| name).collect();
            prop_assert_eq!(names, CheckName::ALL.to_vec());
            for (_, check) in outcome.live_checks.iter() {
                prop_assert_eq!(check.status, check.severity.status());
            }
            if let Some(rep) = outcome.rep {
                prop_assert!(check_summary(&rep).is_empty());
            }
        }
    }

    #[test]
    fn pt_classify_is_monotonic(a in -200.0_f64..200.0, b in -200.0_f64..200.0) {
        let band = SeverityBand::new(10.0, 20.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(lo, band) <= classify(hi, band));
    }
}

#[test]
fn accepted_reps_pass_invariant_checks() {
    let mut engine = MotionEngine::new(MotionConfig::default());
    let reps: Vec<_> = squat_set(4, 0.85)
        .iter()
        .filter_map(|f| engine.process_frame(f).rep)
        .collect();
    assert_eq!(reps.len(), 4);
    for (i, rep) in reps.iter().enumerate() {
        assert_eq!(rep.rep_index, i as u32);
        assert!(check_summary(rep).is_empty());
    }
    for pair in reps.windows(2) {
        assert!(pair[0].end_frame < pair[1].start_frame);
    }
}

#[test]
fn push_up_set_is_counted_with_clean_form() {
    let mut engine = MotionEngine::new(MotionConfig::for_exercise(ExerciseKind::PushUp));
    let frames = push_up_set(3, 0.9);
    let reps: Vec<_> = frames
        .iter()
        .filter_map(|f| engine.process_frame(f).rep)
        .collect();

    assert_eq!(reps.len(), 3);
    assert_eq!(engine.exercise(), ExerciseKind::PushUp);
    assert_eq!(engine.stats().reps_dropped, 0);
    for (i, rep) in reps.iter().enumerate() {
        assert_eq!(rep.rep_index, i as u32);
        assert!(rep.start_frame <= rep.bottom_frame && rep.bottom_frame <= rep.end_frame);
        assert!(check_summary(rep).is_empty());
        for (name, check) in rep.checks.iter() {
            assert_eq!(check.severity, Severity::Low, "{name} on rep {i}");
        }
        assert!(rep.checks.depth.evidence.contains_key("elbow_angle_deg"));
    }
}

#[test]
fn push_up_preset_ignores_squat_motion_of_the_shoulders() {
    // 深蹲时肩部下降明显，但肘角几乎不变，俯卧撑分段器不应计数
    let mut engine = MotionEngine::new(MotionConfig::for_exercise(ExerciseKind::PushUp));
    let reps: Vec<_> = squat_set(2, 0.9)
        .iter()
        .filter_map(|f| engine.process_frame(f).rep)
        .collect();
    assert!(reps.is_empty());
}
