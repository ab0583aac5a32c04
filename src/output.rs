// esu - ElasticSearch Utility for managing an Elasticsearch cluster
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use colored::Colorize;
use std::env;

/// Whether to emit ANSI styling on a stream. `--no-color` and `NO_COLOR`
/// always win; otherwise only terminals get color.
pub fn color_enabled(no_color_flag: bool, is_terminal: bool) -> bool {
    should_color(no_color_flag, env::var_os("NO_COLOR").is_some(), is_terminal)
}

fn should_color(no_color_flag: bool, no_color_env: bool, is_terminal: bool) -> bool {
    !no_color_flag && !no_color_env && is_terminal
}

/// The single line printed for any failed command, including the chain of
/// causes.
pub fn error_line(err: &anyhow::Error, styled: bool) -> String {
    let text = format!("ERROR: {err:#}");
    if styled {
        text.red().to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn color_needs_a_terminal_and_no_opt_out() {
        assert!(should_color(false, false, true));
        assert!(!should_color(true, false, true));
        assert!(!should_color(false, true, true));
        assert!(!should_color(false, false, false));
    }

    #[test]
    fn error_line_includes_causes() {
        let err = Err::<(), _>(anyhow!("connection refused"))
            .context("GET http://localhost:9200/")
            .unwrap_err();
        assert_eq!(
            error_line(&err, false),
            "ERROR: GET http://localhost:9200/: connection refused"
        );
    }

    #[test]
    fn styled_error_line_is_red() {
        colored::control::set_override(true);
        let line = error_line(&anyhow!("boom"), true);
        assert!(line.starts_with("\u{1b}[31m"));
        assert!(line.contains("ERROR: boom"));
    }
}
