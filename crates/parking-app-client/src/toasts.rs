//! Short lived notifications shown in the corner of the window

use std::{collections::VecDeque, time::Duration};

use parking_shared::errors::ApiError;
use tracing::debug;
use web_time::Instant;

/// More than this and the oldest are dropped early
const MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug)]
struct Toast {
    kind: ToastKind,
    text: String,
    shown_at: Instant,
}

#[derive(Debug)]
pub struct Toasts {
    lifetime: Duration,
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            items: VecDeque::new(),
        }
    }

    pub fn info<S: Into<String>>(&mut self, text: S) {
        self.push(ToastKind::Info, text.into());
    }

    pub fn success<S: Into<String>>(&mut self, text: S) {
        self.push(ToastKind::Success, text.into());
    }

    pub fn error<S: Into<String>>(&mut self, text: S) {
        self.push(ToastKind::Error, text.into());
    }

    /// Shows the user facing text of a failed request
    pub fn api_error(&mut self, err: &ApiError) {
        self.error(err.user_text());
    }

    fn push(&mut self, kind: ToastKind, text: String) {
        debug!(?kind, text, "toast");
        if self.items.len() == MAX_VISIBLE {
            self.items.pop_front();
        }
        self.items.push_back(Toast {
            kind,
            text,
            shown_at: Instant::now(),
        });
    }

    /// Drops toasts that have been visible for their whole lifetime
    fn expire(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.items
            .retain(|toast| now.duration_since(toast.shown_at) < lifetime);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.expire(Instant::now());
        if self.items.is_empty() {
            return;
        }
        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -40.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (i, toast) in self.items.iter().enumerate() {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.horizontal(|ui| {
                            let color = match toast.kind {
                                ToastKind::Info => ui.visuals().text_color(),
                                ToastKind::Success => egui::Color32::from_rgb(40, 160, 70),
                                ToastKind::Error => ui.visuals().error_fg_color,
                            };
                            ui.colored_label(color, &toast.text);
                            if ui.small_button("x").clicked() {
                                dismissed = Some(i);
                            }
                        });
                    });
                }
            });
        if let Some(i) = dismissed {
            self.items.remove(i);
        }
        // Wake up to remove the oldest one
        ctx.request_repaint_after(self.lifetime);
    }
}

#[cfg(test)]
mod tests {
    use parking_shared::errors::ErrorCategory;
    use rstest::rstest;

    use super::*;

    #[test]
    fn toasts_expire_after_lifetime() {
        let mut toasts = Toasts::new(Duration::from_secs(5));
        toasts.info("saved");
        let shown_at = toasts.items[0].shown_at;

        toasts.expire(shown_at + Duration::from_secs(4));
        assert!(!toasts.is_empty());

        toasts.expire(shown_at + Duration::from_secs(5));
        assert!(toasts.is_empty());
    }

    #[test]
    fn oldest_dropped_when_full() {
        let mut toasts = Toasts::new(Duration::from_secs(5));
        for i in 0..=MAX_VISIBLE {
            toasts.info(i.to_string());
        }

        assert_eq!(toasts.items.len(), MAX_VISIBLE);
        assert_eq!(toasts.items[0].text, "1");
    }

    #[rstest]
    #[case::known_key("error.invalid.credentials", "Invalid login or password")]
    #[case::unknown_key("error.brand.new", "error.brand.new")]
    fn api_error_shows_readable_text(#[case] key: &str, #[case] expected: &str) {
        let mut toasts = Toasts::new(Duration::from_secs(5));
        let err = ApiError {
            category: ErrorCategory::Api,
            status: Some(400),
            message: key.to_string(),
            violations: vec![],
        };

        toasts.api_error(&err);

        assert_eq!(toasts.items[0].kind, ToastKind::Error);
        assert_eq!(toasts.items[0].text, expected);
    }
}
