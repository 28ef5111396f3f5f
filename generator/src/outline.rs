use std::sync::LazyLock;

use regex::Regex;

static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-+] ").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

impl EntryKind {
    fn from_marker(marker: &str) -> Self {
        if marker.starts_with('+') { Self::Folder } else { Self::File }
    }

    pub fn class(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Folder => "📁",
            Self::File => "🖹",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub label: String,
    children: Vec<EntryId>,
}

impl Entry {
    /// `📁 label` or `🖹 label`
    pub fn display_label(&self) -> String {
        format!("{} {}", self.kind.icon(), self.label)
    }

    pub fn children(&self) -> &[EntryId] {
        &self.children
    }
}

/// A tree of folders and files parsed from an indented `+`/`-` list.
///
/// Entries live in an arena and refer to their children by index; the
/// top-level entries are kept in `roots` in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    entries: Vec<Entry>,
    roots: Vec<EntryId>,
}

impl Outline {
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    /// Build the outline line by line.
    ///
    /// The depth of a line is the character offset of its first `- ` or `+ `
    /// marker. A line attaches to the innermost open folder with a strictly
    /// smaller depth. Scanning stops at the first line without a marker.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut outline = Self::default();

        // `None` is the root container and the "no indentation" depth, which
        // orders below every `Some(depth)` and so is never popped.
        let mut open: Vec<Option<EntryId>> = vec![None];
        let mut depths: Vec<Option<usize>> = vec![None];

        for line in lines {
            let Some(marker) = MARKER.find(line) else {
                log::debug!("folders: stop at line without marker: {line:?}");
                break;
            };

            let depth = Some(line[..marker.start()].chars().count());
            let kind = EntryKind::from_marker(marker.as_str());
            let label = line[marker.end()..].to_string();

            while depths.last().is_some_and(|&top| depth <= top) {
                open.pop();
                depths.pop();
            }

            let parent = open.last().copied().flatten();
            let id = outline.push(parent, kind, label);

            if kind == EntryKind::Folder {
                open.push(Some(id));
                depths.push(depth);
            }
        }

        log::debug!("folders: parsed {} entries", outline.len());

        outline
    }

    fn push(&mut self, parent: Option<EntryId>, kind: EntryKind, label: String) -> EntryId {
        let id = EntryId(self.entries.len());
        self.entries.push(Entry {
            kind,
            label,
            children: Vec::new(),
        });

        match parent {
            Some(parent) => self.entries[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    #[cfg(test)]
    fn children(&self, id: EntryId) -> impl Iterator<Item = &Entry> {
        self.get(id).children.iter().map(|&c| self.get(c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of ancestors of `id`, top-level entries have depth 0.
    #[cfg(test)]
    fn depth_of(&self, id: EntryId) -> Option<usize> {
        fn find(outline: &Outline, ids: &[EntryId], target: EntryId, depth: usize) -> Option<usize> {
            ids.iter().find_map(|&id| {
                if id == target {
                    Some(depth)
                } else {
                    find(outline, outline.get(id).children(), target, depth + 1)
                }
            })
        }

        find(self, &self.roots, id, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels<'a>(outline: &'a Outline, ids: &[EntryId]) -> Vec<&'a str> {
        ids.iter().map(|&id| outline.get(id).label.as_str()).collect()
    }

    #[test]
    fn empty_input() {
        let outline = Outline::parse("");
        assert!(outline.is_empty());
        assert!(outline.roots().is_empty());
    }

    #[test]
    fn folder_with_files() {
        let outline = Outline::from_lines(["+ docs", "  - readme.md", "  - license"]);

        assert_eq!(labels(&outline, outline.roots()), ["docs"]);
        let docs = outline.get(outline.roots()[0]);
        assert_eq!(docs.kind, EntryKind::Folder);
        assert_eq!(labels(&outline, docs.children()), ["readme.md", "license"]);
        assert!(
            outline
                .children(outline.roots()[0])
                .all(|e| e.kind == EntryKind::File)
        );
    }

    #[test]
    fn nested_folders() {
        let outline = Outline::from_lines(["+ a", " + b", "  - c"]);

        assert_eq!(labels(&outline, outline.roots()), ["a"]);
        let a = outline.get(outline.roots()[0]);
        assert_eq!(labels(&outline, a.children()), ["b"]);
        let b = outline.get(a.children()[0]);
        assert_eq!(b.kind, EntryKind::Folder);
        assert_eq!(labels(&outline, b.children()), ["c"]);
        assert_eq!(outline.get(b.children()[0]).kind, EntryKind::File);
        assert_eq!(outline.depth_of(b.children()[0]), Some(2));
    }

    #[test]
    fn sibling_folders() {
        let outline = Outline::from_lines(["+ a", " - b", "+ c", " - d"]);

        assert_eq!(labels(&outline, outline.roots()), ["a", "c"]);
        let a = outline.get(outline.roots()[0]);
        let c = outline.get(outline.roots()[1]);
        assert_eq!(labels(&outline, a.children()), ["b"]);
        assert_eq!(labels(&outline, c.children()), ["d"]);
    }

    #[test]
    fn equal_depth_closes_folder() {
        let outline = Outline::from_lines(["+ a", "+ b", "- c"]);

        assert_eq!(labels(&outline, outline.roots()), ["a", "b", "c"]);
        assert!(outline.get(outline.roots()[0]).children().is_empty());
    }

    #[test]
    fn dedent_closes_several_folders() {
        let outline = Outline::from_lines([
            "+ src",
            "  + bin",
            "    + tools",
            "      - gen.rs",
            "- Cargo.toml",
        ]);

        assert_eq!(labels(&outline, outline.roots()), ["src", "Cargo.toml"]);
        assert_eq!(outline.depth_of(outline.roots()[1]), Some(0));
    }

    #[test]
    fn dedent_to_intermediate_depth() {
        let outline = Outline::from_lines(["+ a", "    + b", "      - c", "  - d"]);

        // `d` is shallower than `b` but deeper than `a`
        let a = outline.get(outline.roots()[0]);
        assert_eq!(labels(&outline, a.children()), ["b", "d"]);
    }

    #[test]
    fn stops_at_line_without_marker() {
        let outline = Outline::from_lines(["- x", "some free text", "- y"]);

        assert_eq!(labels(&outline, outline.roots()), ["x"]);
        assert_eq!(outline.len(), 1);
    }

    #[test]
    fn leading_text_without_marker_stops_immediately() {
        let outline = Outline::parse("free text\n- x\n");
        assert!(outline.is_empty());
    }

    #[test]
    fn deep_indent_attaches_to_innermost_folder() {
        let outline = Outline::from_lines(["+ a", "          - far", "  - near"]);

        let a = outline.get(outline.roots()[0]);
        assert_eq!(labels(&outline, a.children()), ["far", "near"]);
    }

    #[test]
    fn file_does_not_open_container() {
        let outline = Outline::from_lines(["- a", "  - b"]);

        assert_eq!(labels(&outline, outline.roots()), ["a", "b"]);
    }

    #[test]
    fn label_keeps_text_after_marker() {
        let outline = Outline::from_lines(["- my-file + notes.txt"]);

        let entry = outline.get(outline.roots()[0]);
        assert_eq!(entry.label, "my-file + notes.txt");
        assert_eq!(entry.display_label(), "🖹 my-file + notes.txt");
    }

    #[test]
    fn marker_kind() {
        assert_eq!(EntryKind::from_marker("+ "), EntryKind::Folder);
        assert_eq!(EntryKind::from_marker("- "), EntryKind::File);
    }

    #[test]
    fn depth_counts_characters() {
        // two-byte characters before the marker count once each
        let outline = Outline::from_lines(["+ a", "éé- b", "  - c"]);

        let a = outline.get(outline.roots()[0]);
        assert_eq!(labels(&outline, a.children()), ["b", "c"]);
    }

    #[test]
    fn depth_matches_open_ancestors() {
        let lines = ["+ a", "  + b", "    - c", "  - d", "+ e", "  - f"];
        let expected = [0, 1, 2, 1, 0, 1];

        let outline = Outline::from_lines(lines);

        for (i, expected) in expected.into_iter().enumerate() {
            assert_eq!(outline.depth_of(EntryId(i)), Some(expected), "line {i}");
        }
    }

    #[test]
    fn parse_is_idempotent() {
        let text = "+ docs\n  - index.md\n  + api\n    - outline.md\n- README.md\n";
        assert_eq!(Outline::parse(text), Outline::parse(text));
    }

    #[test]
    fn display_labels_carry_icons() {
        let outline = Outline::from_lines(["+ docs", "  - readme.md"]);

        let docs = outline.get(outline.roots()[0]);
        assert_eq!(docs.display_label(), "📁 docs");
        assert_eq!(outline.get(docs.children()[0]).display_label(), "🖹 readme.md");
    }
}
