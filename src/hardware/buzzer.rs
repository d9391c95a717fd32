//! Piezo buzzer melodies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    C4,
    D4,
    E4,
    F4,
    G4,
    A4,
    B4,
    C5,
}

impl Note {
    pub fn frequency(&self) -> u32 {
        match self {
            Note::C4 => 262,
            Note::D4 => 294,
            Note::E4 => 330,
            Note::F4 => 349,
            Note::G4 => 392,
            Note::A4 => 440,
            Note::B4 => 494,
            Note::C5 => 523,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Melody {
    Success,
    Error,
    Alert,
    Deploy,
}

/// `None` is a rest. Durations are seconds.
type Step = (Option<Note>, f32);

const SUCCESS: &[Step] = &[
    (Some(Note::C4), 0.15),
    (Some(Note::E4), 0.15),
    (Some(Note::G4), 0.15),
    (Some(Note::C5), 0.3),
];
const ERROR: &[Step] = &[(Some(Note::C5), 0.2), (Some(Note::G4), 0.2), (Some(Note::C4), 0.4)];
const ALERT: &[Step] = &[
    (Some(Note::A4), 0.1),
    (None, 0.05),
    (Some(Note::A4), 0.1),
    (None, 0.05),
    (Some(Note::A4), 0.3),
];
const DEPLOY: &[Step] = &[
    (Some(Note::C4), 0.1),
    (Some(Note::D4), 0.1),
    (Some(Note::E4), 0.1),
    (Some(Note::F4), 0.1),
    (Some(Note::G4), 0.3),
];

impl Melody {
    pub fn name(&self) -> &'static str {
        match self {
            Melody::Success => "success",
            Melody::Error => "error",
            Melody::Alert => "alert",
            Melody::Deploy => "deploy",
        }
    }

    pub fn steps(&self) -> &'static [Step] {
        match self {
            Melody::Success => SUCCESS,
            Melody::Error => ERROR,
            Melody::Alert => ALERT,
            Melody::Deploy => DEPLOY,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.steps().iter().map(|(_, secs)| secs).sum())
    }
}

/// Simulated buzzer. Playback runs on a short-lived thread and a newer
/// melody cuts off an older one.
pub struct Buzzer {
    pin: u8,
    generation: Arc<AtomicU64>,
}

impl Buzzer {
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn play(&self, melody: Melody) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let pin = self.pin;

        tracing::debug!(melody = melody.name(), pin, "Buzzer");
        let spawned = thread::Builder::new()
            .name("devdash-buzzer".to_string())
            .spawn(move || {
                for (note, secs) in melody.steps() {
                    if current.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    if let Some(note) = note {
                        tracing::trace!(pin, hz = note.frequency(), secs, "tone");
                    }
                    thread::sleep(Duration::from_secs_f32(*secs));
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Buzzer thread failed to start");
        }
    }

    /// Cut off any melody in progress.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_table() {
        assert_eq!(Note::C4.frequency(), 262);
        assert_eq!(Note::A4.frequency(), 440);
        assert_eq!(Note::C5.frequency(), 523);
    }

    #[test]
    fn test_melody_durations() {
        let ms = |m: Melody| m.duration().as_millis() as i64;
        assert!((ms(Melody::Success) - 750).abs() <= 1);
        assert!((ms(Melody::Error) - 800).abs() <= 1);
        assert_eq!(Melody::Alert.steps().iter().filter(|(n, _)| n.is_none()).count(), 2);
        assert_eq!(Melody::Deploy.steps().len(), 5);
    }
}
