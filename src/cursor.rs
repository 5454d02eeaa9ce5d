//! Navigation cursor over the two-level user/story collection
//!
//! The cursor is the only authoritative position; the current story is
//! always derived from it. All transitions are pure functions of
//! `(collection, viewer id, cursor)` so they can be tested without any
//! engine machinery. Users with no stories are never eligible landing
//! targets.

use crate::model::StoryUser;

/// Position of the currently displayed story
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Index into the user collection
    pub user: usize,

    /// Index into that user's stories
    pub story: usize,
}

impl Cursor {
    /// Cursor at the first story of the first user
    pub const ORIGIN: Cursor = Cursor { user: 0, story: 0 };

    pub fn new(user: usize, story: usize) -> Self {
        Self { user, story }
    }
}

/// Outcome of a cursor transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The cursor moved to a new valid position
    Moved(Cursor),

    /// The traversal ran off the end; the session is over
    End,

    /// The transition has nowhere to go; the cursor is unchanged
    Stay,
}

/// Scan direction for eligible-user lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Forward,
    Backward,
}

/// Find the nearest user index in `dir` starting from `from` (exclusive)
/// that has at least one story, optionally skipping the viewer's own entry.
fn next_eligible(
    users: &[StoryUser],
    viewer_id: &str,
    from: usize,
    dir: Scan,
    skip_self: bool,
) -> Option<usize> {
    let eligible = |idx: &usize| {
        let user = &users[*idx];
        if user.stories.is_empty() {
            return false;
        }
        !(skip_self && user.user_id == viewer_id)
    };

    match dir {
        Scan::Forward => (from + 1..users.len()).find(eligible),
        Scan::Backward => (0..from).rev().find(eligible),
    }
}

/// Whether the cursor currently sits on the viewer's own user entry
fn on_own_story(users: &[StoryUser], viewer_id: &str, at: Cursor) -> bool {
    users
        .get(at.user)
        .is_some_and(|u| u.user_id == viewer_id)
}

/// Move to the next story: within the current user first, then to the
/// first eligible following user.
///
/// The viewer's own last story is terminal: autoplaying through one's own
/// stories never falls through into other users' content, and the viewer's
/// own entry is skipped when crossing users.
pub fn advance(users: &[StoryUser], viewer_id: &str, at: Cursor) -> Step {
    let Some(user) = users.get(at.user) else {
        return Step::End;
    };

    if at.story + 1 < user.stories.len() {
        return Step::Moved(Cursor::new(at.user, at.story + 1));
    }

    if user.user_id == viewer_id {
        return Step::End;
    }

    match next_eligible(users, viewer_id, at.user, Scan::Forward, true) {
        Some(next) => Step::Moved(Cursor::new(next, 0)),
        None => Step::End,
    }
}

/// Move to the previous story: within the current user first, then to the
/// last story of the nearest eligible preceding user.
///
/// The viewer's own entry is skipped while scanning backward only when the
/// cursor is not already on it. Cannot retreat past the first eligible
/// user.
pub fn retreat(users: &[StoryUser], viewer_id: &str, at: Cursor) -> Step {
    if at.story > 0 {
        return Step::Moved(Cursor::new(at.user, at.story - 1));
    }

    let skip_self = !on_own_story(users, viewer_id, at);
    match next_eligible(users, viewer_id, at.user, Scan::Backward, skip_self) {
        Some(prev) => Step::Moved(Cursor::new(prev, users[prev].stories.len() - 1)),
        None => Step::Stay,
    }
}

/// Jump to the first story of the next eligible user, discarding the
/// current story's remaining progress.
///
/// Follows `advance`'s self rule: swiping forward from the viewer's own
/// story ends the session rather than falling through into other users.
pub fn next_user(users: &[StoryUser], viewer_id: &str, at: Cursor) -> Step {
    if on_own_story(users, viewer_id, at) {
        return Step::End;
    }

    match next_eligible(users, viewer_id, at.user, Scan::Forward, true) {
        Some(next) => Step::Moved(Cursor::new(next, 0)),
        None => Step::End,
    }
}

/// Jump to the first story of the previous eligible user.
///
/// Follows `retreat`'s conditional self-skip; no-op when no eligible user
/// precedes the cursor.
pub fn prev_user(users: &[StoryUser], viewer_id: &str, at: Cursor) -> Step {
    let skip_self = !on_own_story(users, viewer_id, at);
    match next_eligible(users, viewer_id, at.user, Scan::Backward, skip_self) {
        Some(prev) => Step::Moved(Cursor::new(prev, 0)),
        None => Step::Stay,
    }
}

/// Clamp an initial position into the collection, falling forward to the
/// first user that has stories when the requested slot is unusable.
///
/// Returns `None` when no user in the collection has any stories.
pub fn clamp_initial(users: &[StoryUser], requested: Cursor) -> Option<Cursor> {
    let in_bounds = users
        .get(requested.user)
        .is_some_and(|u| requested.story < u.stories.len());
    if in_bounds {
        return Some(requested);
    }

    users
        .iter()
        .position(|u| !u.stories.is_empty())
        .map(|user| Cursor::new(user, 0))
}
