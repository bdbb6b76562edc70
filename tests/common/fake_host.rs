//! Fake editor host for E2E testing
//!
//! Records every call the record editor makes so tests can assert on opened
//! and closed views and on the messages shown to the user. Focus and prompt
//! answers are scripted by the test.

use async_trait::async_trait;
use jsonl_record::host::{EditorHost, FocusedView, InputValidator, MessageLevel};
use jsonl_record::SurfaceId;
use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

#[derive(Default)]
struct HostState {
    open_views: Vec<SurfaceId>,
    closed_views: Vec<SurfaceId>,
    messages: Vec<(MessageLevel, String)>,
    focused: Option<FocusedView>,
    prompt_answers: VecDeque<Option<String>>,
    prompts: Vec<(String, String)>,
    rejected_inputs: Vec<String>,
}

/// In-memory host
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    /// Focus a view
    pub fn focus(&self, view: Option<FocusedView>) {
        self.lock().focused = view;
    }

    /// Queue the answer for the next prompt (`None` cancels)
    pub fn answer_prompt(&self, answer: Option<&str>) {
        self.lock()
            .prompt_answers
            .push_back(answer.map(str::to_string));
    }

    /// Views currently open, in opening order
    pub fn open_views(&self) -> Vec<SurfaceId> {
        self.lock().open_views.clone()
    }

    pub fn closed_views(&self) -> Vec<SurfaceId> {
        self.lock().closed_views.clone()
    }

    pub fn messages_at(&self, level: MessageLevel) -> Vec<String> {
        self.lock()
            .messages
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Prompts shown so far as `(prompt, default value)`
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.lock().prompts.clone()
    }

    /// Answers the validator refused
    pub fn rejected_inputs(&self) -> Vec<String> {
        self.lock().rejected_inputs.clone()
    }
}

#[async_trait]
impl EditorHost for FakeHost {
    async fn open_view(&self, surface: &SurfaceId, _content_type: &str) -> io::Result<()> {
        let mut state = self.lock();
        state.open_views.push(surface.clone());
        state.focused = Some(FocusedView::Surface(surface.clone()));
        Ok(())
    }

    async fn close_view(&self, surface: &SurfaceId) -> io::Result<()> {
        let mut state = self.lock();
        state.open_views.retain(|s| s != surface);
        state.closed_views.push(surface.clone());
        if state.focused == Some(FocusedView::Surface(surface.clone())) {
            state.focused = None;
        }
        Ok(())
    }

    fn focused_view(&self) -> Option<FocusedView> {
        self.lock().focused.clone()
    }

    async fn prompt_for_text(
        &self,
        prompt: &str,
        default_value: &str,
        validator: &InputValidator,
    ) -> Option<String> {
        let mut state = self.lock();
        state
            .prompts
            .push((prompt.to_string(), default_value.to_string()));

        // Like a real input box, keep asking until the input validates
        while let Some(answer) = state.prompt_answers.pop_front() {
            match answer {
                None => return None,
                Some(text) => match validator(text.as_str()) {
                    None => return Some(text),
                    Some(_) => state.rejected_inputs.push(text),
                },
            }
        }
        None
    }

    fn show_message(&self, level: MessageLevel, message: &str) {
        self.lock().messages.push((level, message.to_string()));
    }
}
