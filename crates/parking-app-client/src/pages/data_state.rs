use futures::channel::oneshot;
use parking_shared::errors::ApiError;
use tracing::warn;

use crate::toasts::Toasts;

#[derive(Debug)]
pub struct Awaiting<T>(pub oneshot::Receiver<anyhow::Result<T>>);

/// A value loaded from the server, or on its way
#[derive(Debug, Default)]
pub enum DataState<T> {
    #[default]
    None,
    AwaitingResponse(Awaiting<T>),
    Present(T),
    Failed(ApiError),
}

impl<T> DataState<T> {
    /// Starts the request if nothing was requested yet and otherwise shows
    /// the progress
    ///
    /// A failure is also reported as a toast. Nothing is shown once the data
    /// is present, the caller renders it instead
    pub fn egui_get<F>(
        &mut self,
        ui: &mut egui::Ui,
        toasts: &mut Toasts,
        retry_msg: Option<&str>,
        fetch_fn: F,
    ) where
        F: FnOnce() -> Awaiting<T>,
    {
        match self {
            DataState::None => {
                ui.spinner();
                *self = DataState::AwaitingResponse(fetch_fn());
            }
            DataState::AwaitingResponse(_) => {
                if self.poll(toasts) {
                    ui.ctx().request_repaint();
                } else {
                    ui.spinner();
                }
            }
            DataState::Present(_) => {}
            DataState::Failed(e) => {
                ui.colored_label(ui.visuals().error_fg_color, e.user_text());
                if ui.button(retry_msg.unwrap_or("Retry Request")).clicked() {
                    *self = DataState::default();
                }
            }
        }
    }

    /// Moves on from [`DataState::AwaitingResponse`] if the response arrived
    ///
    /// Returns `true` if the state changed
    pub fn poll(&mut self, toasts: &mut Toasts) -> bool {
        let DataState::AwaitingResponse(rx) = self else {
            return false;
        };
        match Self::await_data(rx) {
            Some(new_state) => {
                if let DataState::Failed(e) = &new_state {
                    toasts.api_error(e);
                }
                *self = new_state;
                true
            }
            None => false,
        }
    }

    pub fn await_data(rx: &mut Awaiting<T>) -> Option<Self> {
        Some(match rx.0.try_recv() {
            Ok(Some(Ok(data))) => DataState::Present(data),
            Ok(Some(Err(e))) => {
                let api_error = ApiError::from_anyhow(&e);
                warn!(?api_error, "error response received instead of the data");
                DataState::Failed(api_error)
            }
            Ok(None) => return None,
            Err(e) => {
                warn!(?e, "error receiving on channel");
                DataState::Failed(ApiError::network(e.to_string()))
            }
        })
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            DataState::Present(data) => Some(data),
            _ => None,
        }
    }

    /// Returns `true` if the data state is [`Present`].
    ///
    /// [`Present`]: DataState::Present
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(..))
    }

    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingResponse(..))
    }

    /// A new request may be sent. Failures may be retried
    #[must_use]
    pub fn can_send(&self) -> bool {
        matches!(self, Self::None | Self::Failed(_))
    }

    /// Shows the spinner while waiting and the reason of a failure
    pub fn ui_status(&self, ui: &mut egui::Ui) {
        match self {
            DataState::AwaitingResponse(_) => {
                ui.spinner();
            }
            DataState::Failed(e) => {
                ui.colored_label(ui.visuals().error_fg_color, e.user_text());
            }
            DataState::None | DataState::Present(_) => {}
        }
    }
}

impl<T> From<oneshot::Receiver<anyhow::Result<T>>> for DataState<T> {
    fn from(rx: oneshot::Receiver<anyhow::Result<T>>) -> Self {
        Self::AwaitingResponse(Awaiting(rx))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_shared::errors::ErrorCategory;

    use super::*;

    fn toasts() -> Toasts {
        Toasts::new(Duration::from_secs(5))
    }

    #[test]
    fn stays_awaiting_until_response() {
        let (tx, rx) = oneshot::channel::<anyhow::Result<u32>>();
        let mut state = DataState::from(rx);
        let mut toasts = toasts();

        assert!(!state.poll(&mut toasts));
        assert!(state.is_awaiting());

        tx.send(Ok(7)).unwrap();
        assert!(state.poll(&mut toasts));

        assert_eq!(state.present(), Some(&7));
        assert!(toasts.is_empty());
    }

    #[test]
    fn failure_is_toasted() {
        let (tx, rx) = oneshot::channel::<anyhow::Result<u32>>();
        let mut state = DataState::from(rx);
        let mut toasts = toasts();

        tx.send(Err(ApiError::local("error.parking.not.found").into()))
            .unwrap();
        state.poll(&mut toasts);

        assert!(matches!(&state, DataState::Failed(e) if e.message == "error.parking.not.found"));
        assert!(!toasts.is_empty());
    }

    #[test]
    fn dropped_sender_is_a_network_failure() {
        let (tx, rx) = oneshot::channel::<anyhow::Result<u32>>();
        let mut state = DataState::from(rx);
        drop(tx);

        state.poll(&mut toasts());

        assert!(matches!(&state, DataState::Failed(e) if e.category == ErrorCategory::Network));
    }

    #[test]
    fn failed_request_may_be_sent_again() {
        let (tx, rx) = oneshot::channel::<anyhow::Result<()>>();
        let mut state = DataState::from(rx);
        assert!(!state.can_send());

        tx.send(Err(ApiError::local("error.optimistic.lock").into()))
            .unwrap();
        state.poll(&mut toasts());

        assert!(state.can_send());
    }
}
