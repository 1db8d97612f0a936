use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::pending::Callback;
use crate::proto::model::U2fResponse;

/// Collects what page callbacks receive, and counts callbacks dropped unrun.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    responses: Arc<Mutex<Vec<U2fResponse>>>,
    dropped: Arc<AtomicUsize>,
}

struct Guard {
    recorder: Recorder,
    fired: bool,
}

impl Drop for Guard {
    fn drop(&mut self) {
        if !self.fired {
            self.recorder.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> Callback {
        let mut guard = Guard {
            recorder: self.clone(),
            fired: false,
        };
        Box::new(move |response| {
            guard.fired = true;
            guard.recorder.responses.lock().unwrap().push(response);
        })
    }

    pub fn responses(&self) -> Vec<U2fResponse> {
        self.responses.lock().unwrap().clone()
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}
