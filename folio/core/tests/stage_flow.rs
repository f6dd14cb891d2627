//! End-to-end page flows driven through the Stage

use std::sync::Arc;
use std::time::Duration;

use folio_core::{
    classes, BubbleSlot, ContentStore, FolioConfig, IntroPhase, MemorySurface, Section, Stage, SurfaceKey,
    SurfaceMap, Surfaces,
};
use pretty_assertions::assert_eq;

fn stage() -> Stage {
    Stage::with_seed(
        &FolioConfig::default(),
        Arc::new(ContentStore::builtin()),
        SurfaceMap::full(),
        7,
    )
}

fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn snapshot(stage: &Stage) -> Vec<Option<MemorySurface>> {
    SurfaceKey::ALL
        .iter()
        .map(|key| stage.surfaces().get(*key).cloned())
        .collect()
}

/// What a host does after a frame: report every armed animation as ended
fn report_animation_ends(stage: &mut Stage) {
    for key in stage.surfaces().armed() {
        let ended = stage
            .surfaces_mut()
            .get_mut(key)
            .is_some_and(MemorySurface::take_animation_end);
        if ended {
            stage.animation_ended(key);
        }
    }
}

#[test]
fn intro_typing_waits_for_chat_box_animation() {
    let mut stage = stage();
    stage.set_visibility(Section::Intro, 1.0);

    stage.advance_to(ms(299));
    assert!(stage.surfaces().armed().is_empty());

    stage.advance_to(ms(300));
    assert_eq!(stage.surfaces().armed(), vec![SurfaceKey::IntroChatBox]);
    let chat_box = stage.surfaces().get(SurfaceKey::IntroChatBox).unwrap();
    assert!(chat_box.has_class(classes::ANIMATE_QUICK_POP));
    assert!(!chat_box.has_class(classes::OPACITY_0));

    // Nothing types until the host reports the pop finished
    stage.advance_to(ms(5000));
    assert_eq!(stage.intro_phase(), IntroPhase::Idle);
    assert_eq!(stage.surfaces().text(SurfaceKey::IntroText), "");

    report_animation_ends(&mut stage);
    stage.advance_to(ms(5029));
    assert_eq!(stage.intro_phase(), IntroPhase::Idle);
    stage.advance_to(ms(5030));
    assert_eq!(stage.intro_phase(), IntroPhase::Typing(0));
    assert_eq!(stage.surfaces().text(SurfaceKey::IntroText), "I");

    // Notifications are once-only
    assert!(stage.surfaces().armed().is_empty());
}

#[test]
fn intro_exit_before_entrance_finishes_cancels_it() {
    let mut stage = stage();
    stage.set_visibility(Section::Intro, 1.0);
    stage.advance_to(ms(100));
    stage.set_visibility(Section::Intro, 0.0);
    stage.advance_to(ms(3000));

    assert!(stage.surfaces().armed().is_empty());
    let surfaces = stage.surfaces();
    assert!(!surfaces.get(SurfaceKey::IntroChatBox).unwrap().is_visible());
    assert!(!surfaces.get(SurfaceKey::IntroCircle).unwrap().is_visible());
    assert!(!surfaces.get(SurfaceKey::IntroBubble).unwrap().is_visible());
    assert_eq!(stage.intro_phase(), IntroPhase::Idle);
}

#[test]
fn intro_and_board_type_independently() {
    let mut stage = stage();
    stage.set_visibility(Section::Intro, 1.0);
    stage.advance_to(ms(300));
    report_animation_ends(&mut stage);

    stage.set_visibility(Section::Blackboard, 1.0);
    stage.activate("music");
    stage.advance_to(Duration::from_secs(120));

    let music = stage.content().topic("music").unwrap().answer.clone();
    assert_eq!(stage.surfaces().text(SurfaceKey::BoardAnswer), music);
    assert_eq!(stage.intro_phase(), IntroPhase::Done);
    assert_eq!(stage.surfaces().text(SurfaceKey::IntroText), "Enjoy your stay !");

    // The last chunk keeps its cursor
    let cursor = stage.surfaces().get(SurfaceKey::IntroCursor).unwrap();
    assert!(!cursor.has_class(classes::CURSOR_HIDDEN));
}

#[test]
fn leaving_the_board_resets_navigation() {
    let mut stage = stage();
    stage.set_visibility(Section::Blackboard, 1.0);
    stage.activate("education");
    stage.activate("education-uni");
    assert_eq!(stage.navigation().previous(), Some("education"));

    stage.set_visibility(Section::Blackboard, 0.0);
    stage.advance_to(ms(599));
    assert_eq!(stage.navigation().current(), Some("education-uni"));

    stage.advance_to(ms(600));
    assert!(stage.navigation().is_empty());

    stage.advance_to(ms(2000));
    let surfaces = stage.surfaces();
    assert_eq!(surfaces.text(SurfaceKey::BoardAnswer), "");
    assert!(!surfaces.get(SurfaceKey::BoardQuestions).unwrap().has_class(classes::HIDDEN));
    assert!(surfaces.get(SurfaceKey::BoardFollowups).unwrap().has_class(classes::HIDDEN));
}

#[test]
fn board_reversal_cancels_pending_entrance() {
    let mut stage = stage();
    stage.set_visibility(Section::Blackboard, 1.0);
    stage.advance_to(ms(200));
    stage.set_visibility(Section::Blackboard, 0.0);
    stage.advance_to(ms(5000));

    let surfaces = stage.surfaces();
    assert!(!surfaces.get(SurfaceKey::BoardBubble).unwrap().is_visible());
    assert!(surfaces.get(SurfaceKey::BoardDialogue).unwrap().has_class(classes::OPACITY_0));
    assert!(!stage.bubble(BubbleSlot::Blackboard).unwrap().is_started());
}

#[test]
fn reset_drops_in_flight_answer() {
    let mut stage = stage();
    stage.activate("music");
    stage.advance_to(ms(400));
    assert!(!stage.surfaces().text(SurfaceKey::BoardAnswer).is_empty());

    stage.reset_blackboard();
    stage.advance_to(Duration::from_secs(10));

    assert!(stage.navigation().is_empty());
    assert_eq!(stage.surfaces().text(SurfaceKey::BoardAnswer), "");
    assert_eq!(stage.pending_tasks(), 0);
}

#[test]
fn back_on_empty_history_matches_reset() {
    let mut backed = stage();
    let mut reset = stage();

    backed.go_back();
    reset.reset_blackboard();
    backed.advance_to(Duration::from_secs(1));
    reset.advance_to(Duration::from_secs(1));

    assert_eq!(backed.navigation(), reset.navigation());
    assert_eq!(snapshot(&backed), snapshot(&reset));
}

#[test]
fn unknown_control_changes_nothing() {
    let mut stage = stage();
    let before = snapshot(&stage);

    stage.activate("no-such-topic");

    assert!(stage.navigation().is_empty());
    assert_eq!(stage.pending_tasks(), 0);
    assert_eq!(snapshot(&stage), before);
}

#[test]
fn followups_replace_questions_in_declared_order() {
    let mut stage = stage();
    stage.activate("education");
    stage.advance_to(ms(349));
    assert_eq!(
        stage.surfaces().get(SurfaceKey::BoardFollowups).unwrap().opacity(),
        0.0
    );

    stage.advance_to(ms(350));
    let followups = stage.surfaces().get(SurfaceKey::BoardFollowups).unwrap();
    let ids: Vec<&str> = followups.controls().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["education-uni", "education-skills", "back"]);
    assert_eq!(followups.opacity(), 1.0);
    assert!(stage.surfaces().get(SurfaceKey::BoardQuestions).unwrap().has_class(classes::HIDDEN));
}
