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

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use fern::FormatCallback;
use log::LevelFilter;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::Result;
use serde_json::Map;

use crate::Config;

type Formatter = fn(out: FormatCallback, message: &fmt::Arguments, record: &log::Record);

/// Install the global logger described by `cfg`.
///
/// Only records emitted by workspace crates (target prefix `searchql_`) pass
/// below `ERROR`; third-party crates are limited to errors. Installing twice
/// keeps the first logger.
pub fn init_logging(name: &str, cfg: &Config) -> Result<()> {
    let mut normal_logger = fern::Dispatch::new();

    // File logger
    if cfg.file.on {
        std::fs::create_dir_all(&cfg.file.dir)?;
        let path = Path::new(&cfg.file.dir).join(format!("{}.log", name));
        let dispatch = fern::Dispatch::new()
            .level(cfg.file.level.parse().unwrap_or(LevelFilter::Info))
            .format(formatter(&cfg.file.format)?)
            .chain(fern::log_file(path)?);
        normal_logger = normal_logger.chain(dispatch);
    }

    // Console logger
    if cfg.stderr.on {
        let dispatch = fern::Dispatch::new()
            .level(cfg.stderr.level.parse().unwrap_or(LevelFilter::Info))
            .format(formatter(&cfg.stderr.format)?)
            .chain(std::io::stderr());
        normal_logger = normal_logger.chain(dispatch);
    }

    let logger = fern::Dispatch::new()
        .filter(|meta| {
            if meta.target().starts_with("searchql_") {
                true
            } else {
                meta.level() <= LevelFilter::Error
            }
        })
        .chain(normal_logger);

    // Set global logger
    if logger.apply().is_err() {
        eprintln!("logger has already been set");
    }

    Ok(())
}

fn formatter(format: &str) -> Result<Formatter> {
    match format {
        "text" => Ok(format_text_log),
        "json" => Ok(format_json_log),
        _ => Err(ErrorCode::BadArguments(format!(
            "logging format {format} is not supported"
        ))),
    }
}

fn format_text_log(out: FormatCallback, message: &fmt::Arguments, record: &log::Record) {
    out.finish(format_args!(
        "{} {:>5} {}: {}:{} {}",
        humantime::format_rfc3339_micros(SystemTime::now()),
        record.level(),
        record.module_path().unwrap_or(""),
        record.file().unwrap_or(""),
        record.line().unwrap_or(0),
        message,
    ));
}

fn format_json_log(out: FormatCallback, message: &fmt::Arguments, record: &log::Record) {
    let mut fields = Map::new();
    fields.insert("message".to_string(), format!("{}", message).into());
    fields.insert("target".to_string(), record.target().into());

    out.finish(format_args!(
        r#"{{"timestamp":"{}","level":"{}","fields":{}}}"#,
        humantime::format_rfc3339_micros(SystemTime::now()),
        record.level(),
        serde_json::to_string(&fields).unwrap_or_default(),
    ));
}
