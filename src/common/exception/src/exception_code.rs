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

#![allow(non_snake_case)]

use crate::exception::ErrorCode;

macro_rules! build_exceptions {
    ($($(#[$meta:meta])* $body:ident($code:expr)),* $(,)?) => {
        impl ErrorCode {
            $(
                paste::item! {
                    $(#[$meta])*
                    pub const [< $body:snake:upper >]: u16 = $code;
                }

                $(#[$meta])*
                pub fn $body(display_text: impl Into<String>) -> ErrorCode {
                    ErrorCode::create(
                        $code,
                        stringify!($body),
                        display_text.into(),
                        String::new(),
                        None,
                    )
                }
            )*
        }
    }
}

// Internal errors [0, 1000].
build_exceptions! {
    Ok(0),
    Internal(1001),
    Unimplemented(1002),
    BadArguments(1006),
    BadDataValueType(1010),
}

// Join errors [1100, 1199].
build_exceptions! {
    /// A field referenced by the ON clause is absent from the row schema.
    MissingField(1101),
    /// A row producer failed mid-stream.
    UpstreamStreamError(1102),
    /// The join operator was driven out of order.
    IllegalJoinState(1103),
}

// Settings errors [2800, 2899].
build_exceptions! {
    UnknownVariable(2801),
    WrongValueForVariable(2803),
}
