use reqwest::Method;

#[derive(Debug, Clone)]
pub struct PathSpec {
    pub path: &'static str,
    pub method: Method,
}

impl PathSpec {
    pub const fn get(path: &'static str) -> Self {
        Self {
            path,
            method: Method::GET,
        }
    }

    pub const fn post(path: &'static str) -> Self {
        Self {
            path,
            method: Method::POST,
        }
    }

    pub const fn put(path: &'static str) -> Self {
        Self {
            path,
            method: Method::PUT,
        }
    }

    pub const fn patch(path: &'static str) -> Self {
        Self {
            path,
            method: Method::PATCH,
        }
    }

    pub const fn delete(path: &'static str) -> Self {
        Self {
            path,
            method: Method::DELETE,
        }
    }

    /// Number of `{}` placeholders in the path
    pub fn param_count(&self) -> usize {
        self.path.matches("{}").count()
    }

    /// Replaces each `{}` in order with the matching parameter
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the number of parameters does not match the
    /// number of placeholders
    pub fn fill(&self, params: &[&str]) -> String {
        debug_assert_eq!(
            self.param_count(),
            params.len(),
            "wrong number of parameters for {}",
            self.path
        );
        let mut result = String::with_capacity(self.path.len());
        let mut params = params.iter();
        let mut segments = self.path.split("{}").peekable();
        while let Some(segment) = segments.next() {
            result.push_str(segment);
            if segments.peek().is_some() {
                result.push_str(params.next().copied().unwrap_or_default());
            }
        }
        result
    }
}
