// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

use owo_colors::OwoColorize;
use unicode_width::UnicodeWidthStr;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

pub fn version_text(verbose: bool) -> String {
    if !verbose {
        return format!("{NAME} {VERSION}\n");
    }

    let rows = [("Name", NAME), ("Version", VERSION), ("Description", DESCRIPTION)];
    let label_width = rows.iter().map(|(label, _)| label.width()).max().unwrap_or(0);

    let mut output = String::new();
    for (label, value) in rows {
        output.push_str(&format!(
            "{}{}  {}\n",
            label.bold(),
            " ".repeat(label_width - label.width()),
            value
        ));
    }
    output
}

pub fn show_version(verbose: bool) {
    print!("{}", version_text(verbose));
}
