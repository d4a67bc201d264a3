//! Preview focus selection
//!
//! Picks what the preview follows each tick, in priority order: the main
//! bubble, then the first child bubble big enough to see, then a plankton
//! (the one followed last tick while it keeps moving, else the fastest).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::SimState;
use crate::consts::{MIN_FOCUS_BUBBLE_WIDTH, MIN_FOCUS_PLANKTON_WIDTH};
use crate::settings::LocaterMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    MainBubble,
    /// Index into the child bubble collection (valid for the current tick)
    ChildBubble(usize),
    /// Plankton ID
    Plankton(u32),
}

/// Choose this tick's focus
pub fn select_focus(state: &SimState) -> Option<Focus> {
    if state.main_bubble.is_some() {
        return Some(Focus::MainBubble);
    }

    if let Some(index) = state
        .child_bubbles
        .iter()
        .position(|b| b.alive && b.body.width() >= MIN_FOCUS_BUBBLE_WIDTH)
    {
        return Some(Focus::ChildBubble(index));
    }

    if let Some(id) = state.focused_plankton {
        if state.find_plankton(id).is_some_and(|p| p.body.speed() > 0.0) {
            return Some(Focus::Plankton(id));
        }
    }

    // Fastest visible plankton; strict comparison keeps the first on ties
    let mut fastest: Option<(f32, u32)> = None;
    for p in &state.plankton {
        if p.body.width() < MIN_FOCUS_PLANKTON_WIDTH {
            continue;
        }
        let speed = p.body.speed();
        if fastest.is_none_or(|(best, _)| speed > best) {
            fastest = Some((speed, p.id));
        }
    }
    fastest.map(|(_, id)| Focus::Plankton(id))
}

/// Should the locater be drawn for this focus
pub fn show_locater(mode: LocaterMode, focus: Option<Focus>) -> bool {
    let Some(focus) = focus else {
        return false;
    };
    match mode {
        LocaterMode::Always => true,
        LocaterMode::Never => false,
        LocaterMode::OnlyMainBubble => focus == Focus::MainBubble,
        LocaterMode::OnlyChildBubbles => matches!(focus, Focus::ChildBubble(_)),
        LocaterMode::OnlyPlankton => matches!(focus, Focus::Plankton(_)),
        LocaterMode::AnythingButMainBubble => focus != Focus::MainBubble,
        LocaterMode::AnythingButPlankton => !matches!(focus, Focus::Plankton(_)),
    }
}

/// Where the focused entity is, if it still exists
pub fn focus_center(state: &SimState, focus: Focus) -> Option<Vec2> {
    match focus {
        Focus::MainBubble => state.main_bubble.as_ref().map(|b| b.body.center),
        Focus::ChildBubble(index) => state
            .child_bubbles
            .get(index)
            .filter(|b| b.alive)
            .map(|b| b.body.center),
        Focus::Plankton(id) => state.find_plankton(id).map(|p| p.body.center),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::Bubble;

    fn state() -> SimState {
        SimState::new(&Settings::default(), Vec2::new(800.0, 600.0), None)
    }

    #[test]
    fn test_empty_tank_has_no_focus() {
        let state = state();
        assert_eq!(select_focus(&state), None);
        assert!(!show_locater(LocaterMode::Always, None));
    }

    #[test]
    fn test_main_bubble_always_wins() {
        let mut state = state();
        state.add_plankton(Vec2::new(10.0, 10.0), 5.0, Vec2::new(100.0, 0.0));
        state.child_bubbles.push(Bubble::child(Vec2::new(50.0, 50.0), 10.0));
        state.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 30.0));
        assert_eq!(select_focus(&state), Some(Focus::MainBubble));
    }

    #[test]
    fn test_first_visible_child_bubble() {
        let mut state = state();
        state.add_plankton(Vec2::new(10.0, 10.0), 5.0, Vec2::new(3.0, 0.0));
        // Too small to follow
        state.child_bubbles.push(Bubble::child(Vec2::new(50.0, 50.0), 1.0));
        let mut popped = Bubble::child(Vec2::new(60.0, 50.0), 10.0);
        popped.pop();
        state.child_bubbles.push(popped);
        state.child_bubbles.push(Bubble::child(Vec2::new(70.0, 50.0), 10.0));
        state.child_bubbles.push(Bubble::child(Vec2::new(80.0, 50.0), 10.0));
        assert_eq!(select_focus(&state), Some(Focus::ChildBubble(2)));
    }

    #[test]
    fn test_sticky_plankton_focus() {
        let mut state = state();
        let slow = state.add_plankton(Vec2::new(10.0, 10.0), 5.0, Vec2::new(0.5, 0.0));
        let fast = state.add_plankton(Vec2::new(20.0, 10.0), 5.0, Vec2::new(3.0, 0.0));
        assert_eq!(select_focus(&state), Some(Focus::Plankton(fast)));

        state.focused_plankton = Some(slow);
        assert_eq!(select_focus(&state), Some(Focus::Plankton(slow)));

        // Stopped plankton lose the focus
        state.plankton[0].body.velocity = Vec2::ZERO;
        assert_eq!(select_focus(&state), Some(Focus::Plankton(fast)));

        // Vanished plankton too
        state.focused_plankton = Some(999);
        assert_eq!(select_focus(&state), Some(Focus::Plankton(fast)));
    }

    #[test]
    fn test_fastest_tie_keeps_first() {
        let mut state = state();
        let first = state.add_plankton(Vec2::new(10.0, 10.0), 5.0, Vec2::new(2.0, 0.0));
        state.add_plankton(Vec2::new(20.0, 10.0), 5.0, Vec2::new(0.0, 2.0));
        // Invisible, even though fastest
        state.add_plankton(Vec2::new(30.0, 10.0), 0.2, Vec2::new(9.0, 0.0));
        assert_eq!(select_focus(&state), Some(Focus::Plankton(first)));
    }

    #[test]
    fn test_locater_modes() {
        let main = Some(Focus::MainBubble);
        let child = Some(Focus::ChildBubble(0));
        let plankton = Some(Focus::Plankton(1));

        assert!(show_locater(LocaterMode::Always, plankton));
        assert!(!show_locater(LocaterMode::Never, main));
        assert!(show_locater(LocaterMode::OnlyMainBubble, main));
        assert!(!show_locater(LocaterMode::OnlyMainBubble, child));
        assert!(show_locater(LocaterMode::OnlyChildBubbles, child));
        assert!(!show_locater(LocaterMode::OnlyChildBubbles, plankton));
        assert!(show_locater(LocaterMode::OnlyPlankton, plankton));
        assert!(!show_locater(LocaterMode::AnythingButMainBubble, main));
        assert!(show_locater(LocaterMode::AnythingButMainBubble, child));
        assert!(!show_locater(LocaterMode::AnythingButPlankton, plankton));
        assert!(show_locater(LocaterMode::AnythingButPlankton, main));
    }

    #[test]
    fn test_focus_center() {
        let mut state = state();
        let id = state.add_plankton(Vec2::new(10.0, 20.0), 5.0, Vec2::ZERO);
        assert_eq!(focus_center(&state, Focus::Plankton(id)), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(focus_center(&state, Focus::MainBubble), None);
        assert_eq!(focus_center(&state, Focus::ChildBubble(3)), None);
    }
}
