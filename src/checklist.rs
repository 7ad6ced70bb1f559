//! Printed manual checklists for deploy, integration and episode wrap-up.

use std::io::{self, Write};

use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Checklist {
    Deploy,
    Integrate,
    Episode,
}

impl Checklist {
    pub fn lines(&self) -> &'static [&'static str] {
        match self {
            Self::Deploy => &[
                "1. Make sure 'git status' is clean.",
                "2. 'git push heroku master'",
                "3. 'buildgate test'",
            ],
            Self::Integrate => &[
                "1. Make sure 'git status' is clean.",
                "2. Build on the integration box.",
                "   a. Walk over to integration box.",
                "   b. 'git pull'",
                "   c. 'buildgate strict=true'",
                "   d. If buildgate fails, stop! Try again after fixing the issue.",
                "3. 'git checkout integration'",
                "4. 'git merge master --no-ff --log'",
                "5. 'git checkout master'",
            ],
            Self::Episode => &[
                "1. Save recording.",
                "2. Double-check sound and framing.",
                "3. Commit source code.",
                "4. Tag episode: 'git tag -a episodeXX -m \"End of episode XX\"'",
            ],
        }
    }

    pub fn print_to(&self, out: &mut dyn Write) -> io::Result<()> {
        for line in self.lines() {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}
