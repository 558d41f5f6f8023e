//! `speedway classify`: device class of user agent strings.

use anyhow::Result;

use super::common::read_lines_from_stdin;
use crate::device::classify;

/// Print `<class>` for one agent, or `<class>\t<agent>` per stdin line.
pub fn classify_agents(user_agent: &str) -> Result<()> {
    if user_agent == "-" {
        for line in read_lines_from_stdin()? {
            println!("{}\t{}", classify(&line), line);
        }
    } else {
        println!("{}", classify(user_agent));
    }
    Ok(())
}
