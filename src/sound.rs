use std::cell::{Cell, RefCell};
use std::io::Write;

/// Fire-and-forget audio feedback. Implementations must never panic.
pub trait Sound {
    fn click(&self);
    fn success(&self);
    fn fail(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Sound for Silent {
    fn click(&self) {}
    fn success(&self) {}
    fn fail(&self) {}
}

/// Terminal bell on failures; clicks and successes stay quiet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bell;

impl Sound for Bell {
    fn click(&self) {}

    fn success(&self) {}

    fn fail(&self) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// Wraps another sound with an on/off switch.
pub struct Toggle<S> {
    inner: S,
    enabled: Cell<bool>,
}

impl<S: Sound> Toggle<S> {
    pub fn new(inner: S, enabled: bool) -> Self {
        Self {
            inner,
            enabled: Cell::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn toggle(&self) -> bool {
        let next = !self.enabled.get();
        self.enabled.set(next);
        next
    }
}

impl<S: Sound> Sound for Toggle<S> {
    fn click(&self) {
        if self.enabled.get() {
            self.inner.click();
        }
    }

    fn success(&self) {
        if self.enabled.get() {
            self.inner.success();
        }
    }

    fn fail(&self) {
        if self.enabled.get() {
            self.inner.fail();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Click,
    Success,
    Fail,
}

/// Keeps every cue it was asked to play.
#[derive(Debug, Default)]
pub struct RecordingSound {
    cues: RefCell<Vec<Cue>>,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.borrow().clone()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues.borrow().iter().filter(|c| **c == cue).count()
    }

    pub fn clear(&self) {
        self.cues.borrow_mut().clear();
    }
}

impl Sound for RecordingSound {
    fn click(&self) {
        self.cues.borrow_mut().push(Cue::Click);
    }

    fn success(&self) {
        self.cues.borrow_mut().push(Cue::Success);
    }

    fn fail(&self) {
        self.cues.borrow_mut().push(Cue::Fail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn toggle_mutes_inner_sound() {
        let toggle = Toggle::new(RecordingSound::new(), true);
        toggle.success();
        toggle.toggle();
        toggle.fail();
        toggle.click();
        assert_eq!(toggle.inner.cues(), vec![Cue::Success]);
        toggle.set_enabled(true);
        toggle.fail();
        assert_eq!(toggle.inner.count(Cue::Fail), 1);
    }

    #[test]
    fn recording_sound_works_behind_rc_dyn() {
        let rec = Rc::new(RecordingSound::new());
        let sound: Rc<dyn Sound> = rec.clone();
        sound.click();
        sound.click();
        assert_eq!(rec.count(Cue::Click), 2);
        rec.clear();
        assert!(rec.cues().is_empty());
    }
}
