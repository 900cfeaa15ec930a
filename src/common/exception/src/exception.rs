// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

pub type Result<T, E = ErrorCode> = std::result::Result<T, E>;

/// The error type of every crate in the workspace.
///
/// An error carries a stable numeric `code`, the `name` of the kind that
/// produced it and a human readable message. Wrapped errors coming from
/// third-party crates are kept as `cause`.
#[derive(Clone)]
pub struct ErrorCode {
    code: u16,
    name: String,
    display_text: String,
    detail: String,
    cause: Option<Arc<dyn Error + Send + Sync + 'static>>,
}

impl ErrorCode {
    pub fn create(
        code: u16,
        name: impl ToString,
        display_text: String,
        detail: String,
        cause: Option<Arc<dyn Error + Send + Sync + 'static>>,
    ) -> ErrorCode {
        ErrorCode {
            code,
            name: name.to_string(),
            display_text,
            detail,
            cause,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn name(&self) -> String {
        self.name.clone()
    }

    pub fn message(&self) -> String {
        let msg = self.display_text();
        if self.detail.is_empty() {
            msg
        } else {
            format!("{}\n{}", msg, self.detail)
        }
    }

    pub fn detail(&self) -> String {
        self.detail.clone()
    }

    pub fn display_text(&self) -> String {
        if let Some(cause) = &self.cause {
            if self.display_text.is_empty() {
                return cause.to_string();
            }
            return format!("{}, cause: {}", self.display_text, cause);
        }
        self.display_text.clone()
    }

    pub fn add_message(self, msg: impl AsRef<str>) -> Self {
        Self {
            display_text: format!("{}\n{}", msg.as_ref(), self.display_text),
            ..self
        }
    }

    pub fn add_detail(self, detail: impl AsRef<str>) -> Self {
        Self {
            detail: detail.as_ref().to_string(),
            ..self
        }
    }

    pub fn set_cause(self, cause: impl Error + Send + Sync + 'static) -> Self {
        Self {
            cause: Some(Arc::new(cause)),
            ..self
        }
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. Code: {}, Text = {}.",
            self.name,
            self.code(),
            self.message(),
        )?;

        if let Some(cause) = &self.cause {
            write!(f, "\n\nCaused by: {:?}", cause)?;
        }

        Ok(())
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. Code: {}, Text = {}.",
            self.name,
            self.code(),
            self.message(),
        )
    }
}

impl Error for ErrorCode {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

/// Convert a foreign `Result` into `Result<T>` with a code chosen by the caller.
///
/// ```ignore
/// let res: Result<Row> = serde_json::from_str(text)
///     .map_err_to_code(ErrorCode::BadDataValueType, || "decode search hit");
/// ```
pub trait ToErrorCode<T, E, CtxFn>
where E: Display + Send + Sync + 'static
{
    fn map_err_to_code<ErrFn, D>(self, err_code_fn: ErrFn, context_fn: CtxFn) -> Result<T>
    where
        ErrFn: FnOnce(String) -> ErrorCode,
        D: Display,
        CtxFn: FnOnce() -> D;
}

impl<T, E, CtxFn> ToErrorCode<T, E, CtxFn> for std::result::Result<T, E>
where E: Display + Send + Sync + 'static
{
    fn map_err_to_code<ErrFn, D>(self, make_exception: ErrFn, context_fn: CtxFn) -> Result<T>
    where
        ErrFn: FnOnce(String) -> ErrorCode,
        D: Display,
        CtxFn: FnOnce() -> D,
    {
        self.map_err(|error| {
            let err_text = format!("{}, cause: {}", context_fn(), error);
            make_exception(err_text)
        })
    }
}

pub trait ErrorCodeResultExt<T> {
    /// Turns an error with the given code into `Ok(None)`, leaving other errors untouched.
    fn or_error_code(self, code: u16) -> Result<Option<T>>;
}

impl<T> ErrorCodeResultExt<T> for Result<T> {
    fn or_error_code(self, code: u16) -> Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.code() == code => Ok(None),
            Err(e) => Err(e),
        }
    }
}
