//! Navigation between the app's sections.
//!
//! [`transition`] is the whole state machine. [`Shell`] applies it and hands
//! back the browser history command to run, and [`MemoryHistory`] stands in
//! for the browser's session history outside a browser.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Home,
    Submit,
    Browse,
    Rank,
    Attendance,
    AccessLog,
    Roster,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Home,
        Section::Submit,
        Section::Browse,
        Section::Rank,
        Section::Attendance,
        Section::AccessLog,
        Section::Roster,
    ];

    pub fn requires_admin(self) -> bool {
        matches!(self, Section::AccessLog | Section::Roster)
    }

    pub fn fragment(self) -> &'static str {
        match self {
            Section::Home => "#home",
            Section::Submit => "#submit",
            Section::Browse => "#browse",
            Section::Rank => "#rank",
            Section::Attendance => "#attendance",
            Section::AccessLog => "#access-log",
            Section::Roster => "#roster",
        }
    }

    /// Unknown or empty fragments land on home.
    pub fn from_fragment(fragment: &str) -> Self {
        let fragment = fragment.trim();
        Self::ALL
            .into_iter()
            .find(|section| {
                section.fragment().trim_start_matches('#') == fragment.trim_start_matches('#')
            })
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Enter(Section),
    Stay,
    Denied(Section),
}

pub fn transition(current: Section, target: Section, is_admin: bool) -> Transition {
    if target.requires_admin() && !is_admin {
        Transition::Denied(target)
    } else if target == current {
        Transition::Stay
    } else {
        Transition::Enter(target)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryCommand {
    Push(&'static str),
    Replace(&'static str),
}

/// Entering any section but home adds a history entry. Home replaces the
/// current one.
pub fn history_command(transition: Transition) -> Option<HistoryCommand> {
    match transition {
        Transition::Enter(Section::Home) => Some(HistoryCommand::Replace(Section::Home.fragment())),
        Transition::Enter(section) => Some(HistoryCommand::Push(section.fragment())),
        Transition::Stay | Transition::Denied(_) => None,
    }
}

/// Section to show after a back or forward event. No state means home, and
/// admin sections fall back to home for everyone else.
pub fn section_from_pop(fragment: Option<&str>, is_admin: bool) -> Section {
    let section = fragment.map(Section::from_fragment).unwrap_or_default();
    if section.requires_admin() && !is_admin {
        Section::Home
    } else {
        section
    }
}

#[derive(Debug, Default)]
pub struct Shell {
    current: Section,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts on the section named by the URL fragment.
    pub fn from_fragment(fragment: &str, is_admin: bool) -> Self {
        Self {
            current: section_from_pop(Some(fragment), is_admin),
        }
    }

    pub fn current(&self) -> Section {
        self.current
    }

    pub fn navigate(
        &mut self,
        target: Section,
        is_admin: bool,
    ) -> (Transition, Option<HistoryCommand>) {
        let transition = transition(self.current, target, is_admin);
        if let Transition::Enter(section) = transition {
            self.current = section;
        }
        (transition, history_command(transition))
    }

    pub fn on_pop(&mut self, fragment: Option<&str>, is_admin: bool) -> Section {
        self.current = section_from_pop(fragment, is_admin);
        self.current
    }

    pub fn reset(&mut self) {
        self.current = Section::Home;
    }
}

/// Browser session history without a browser.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Vec<Option<&'static str>>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self { entries: vec![None] }
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, command: &HistoryCommand) {
        match command {
            HistoryCommand::Push(fragment) => self.entries.push(Some(*fragment)),
            HistoryCommand::Replace(fragment) => {
                if let Some(last) = self.entries.last_mut() {
                    *last = Some(*fragment);
                }
            }
        }
    }

    /// Goes back one entry and returns its state, `None` at the start.
    pub fn back(&mut self) -> Option<&'static str> {
        if self.entries.len() > 1 {
            self.entries.pop();
        }
        self.entries.last().copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_sections_are_gated() {
        for section in [Section::AccessLog, Section::Roster] {
            assert_eq!(
                transition(Section::Home, section, false),
                Transition::Denied(section)
            );
            assert_eq!(
                transition(Section::Home, section, true),
                Transition::Enter(section)
            );
        }
        assert_eq!(
            transition(Section::Home, Section::Rank, false),
            Transition::Enter(Section::Rank)
        );
        assert_eq!(
            transition(Section::Rank, Section::Rank, false),
            Transition::Stay
        );
    }

    #[test]
    fn fragments() {
        assert_eq!(Section::from_fragment("#rank"), Section::Rank);
        assert_eq!(Section::from_fragment("access-log"), Section::AccessLog);
        assert_eq!(Section::from_fragment("#nope"), Section::Home);
        assert_eq!(Section::from_fragment(""), Section::Home);
        for section in Section::ALL {
            assert_eq!(Section::from_fragment(section.fragment()), section);
        }
    }

    #[test]
    fn back_restores_previous_section() {
        let mut shell = Shell::new();
        let mut history = MemoryHistory::new();

        for target in [Section::Browse, Section::Rank] {
            let (_, command) = shell.navigate(target, false);
            history.apply(&command.unwrap());
        }
        assert_eq!(shell.current(), Section::Rank);
        assert_eq!(history.len(), 3);

        assert_eq!(shell.on_pop(history.back(), false), Section::Browse);
        assert_eq!(shell.on_pop(history.back(), false), Section::Home);
        assert_eq!(shell.on_pop(history.back(), false), Section::Home);
    }

    #[test]
    fn denied_changes_nothing() {
        let mut shell = Shell::new();
        let (transition, command) = shell.navigate(Section::Roster, false);
        assert_eq!(transition, Transition::Denied(Section::Roster));
        assert_eq!(command, None);
        assert_eq!(shell.current(), Section::Home);
    }

    #[test]
    fn home_replaces_entry() {
        let mut shell = Shell::new();
        let mut history = MemoryHistory::new();
        let (_, command) = shell.navigate(Section::Submit, false);
        history.apply(&command.unwrap());
        let (_, command) = shell.navigate(Section::Home, false);
        assert_eq!(command, Some(HistoryCommand::Replace("#home")));
        history.apply(&command.unwrap());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn popped_admin_section_needs_admin() {
        assert_eq!(section_from_pop(Some("#roster"), false), Section::Home);
        assert_eq!(section_from_pop(Some("#roster"), true), Section::Roster);
        assert_eq!(section_from_pop(None, true), Section::Home);
        assert_eq!(
            Shell::from_fragment("#access-log", false).current(),
            Section::Home
        );
    }
}
