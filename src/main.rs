//! # glitch-race CLI
//!
//! Command-line interface for the JPEG glitch race.
//!
//! ## Usage
//! ```bash
//! glitch-race -f ~/Pictures/cat.jpg -i 500 -n alice
//! glitch-race -f ~/Pictures/cat.jpg --check
//! ```

mod cli;

use jpeg_glitch_race::Result;

fn main() -> Result<()> {
    cli::run()
}
