//! Tree views: JSON, indented text and clap subcommands

use super::node::AttrTree;
use super::TreeItem;
use clap::Command;
use serde_json::{json, Map, Value};

fn leak(s: &str) -> &'static str {
    Box::leak(s.to_string().into_boxed_str())
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

impl<T: TreeItem> AttrTree<T> {
    /// JSON view: `{"name": ..., "items": [...], "<group>": {...}}`.
    pub fn as_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(self.name()));
        let items: Vec<&str> = self.items().map(|(name, _)| name).collect();
        map.insert("items".to_string(), json!(items));
        for (name, group) in self.groups() {
            map.insert(name.to_string(), group.as_dict());
        }
        Value::Object(map)
    }

    /// Write the subtree as indented text, items before groups.
    pub fn render(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for (name, item) in self.items() {
            match item.tree_description() {
                Some(description) => {
                    out.push_str(&format!("{}- {}  {}\n", indent, name, description))
                }
                None => out.push_str(&format!("{}- {}\n", indent, name)),
            }
        }
        for (name, group) in self.groups() {
            out.push_str(&format!("{}{}\n", indent, name));
            group.render(out, depth + 1);
        }
    }

    /// Add one subcommand per item and one subcommand group per child
    /// group to `command`.
    ///
    /// `leaf` receives each item's subcommand together with the item's
    /// dotted path (prefixed by `prefix`) and returns it completed.
    pub fn add_subcommands<E, F>(
        &self,
        mut command: Command,
        prefix: &str,
        leaf: &mut F,
    ) -> Result<Command, E>
    where
        F: FnMut(Command, &str, &T) -> Result<Command, E>,
    {
        for (name, item) in self.items() {
            let mut sub = Command::new(leak(name));
            if let Some(description) = item.tree_description() {
                sub = sub.about(description);
            }
            sub = leaf(sub, &join_path(prefix, name), item)?;
            command = command.subcommand(sub);
        }

        for (name, group) in self.groups() {
            let sub = Command::new(leak(name))
                .subcommand_required(true)
                .arg_required_else_help(true);
            let sub = group.add_subcommands(sub, &join_path(prefix, name), leaf)?;
            command = command.subcommand(sub);
        }

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::super::AttrTreeConfig;
    use super::*;
    use clap::{Arg, ArgAction};
    use std::convert::Infallible;

    struct Cmd {
        name: &'static str,
        about: Option<&'static str>,
    }

    impl TreeItem for Cmd {
        fn tree_name(&self) -> &str {
            self.name
        }

        fn tree_description(&self) -> Option<String> {
            self.about.map(str::to_string)
        }
    }

    fn tree() -> AttrTree<Cmd> {
        let mut tree = AttrTree::new("__processes__", AttrTreeConfig::default());
        tree.add_item(
            Cmd {
                name: "new",
                about: Some("Create a note"),
            },
            "notes",
        )
        .unwrap();
        tree.add_item(Cmd { name: "list", about: None }, "notes")
            .unwrap();
        tree.add_item(Cmd { name: "up", about: None }, "").unwrap();
        tree
    }

    #[test]
    fn test_as_dict() {
        let dict = tree().as_dict();
        assert_eq!(dict["name"], "__processes__");
        assert_eq!(dict["items"], json!(["up"]));
        assert_eq!(dict["notes"]["items"], json!(["new", "list"]));
    }

    #[test]
    fn test_render() {
        let mut out = String::new();
        tree().render(&mut out, 1);
        assert_eq!(out, "  - up\n  notes\n    - new  Create a note\n    - list\n");
    }

    #[test]
    fn test_add_subcommands() {
        let mut seen = Vec::new();
        let command = tree()
            .add_subcommands::<Infallible, _>(Command::new("my"), "", &mut |sub, path, _| {
                seen.push(path.to_string());
                Ok(sub.arg(Arg::new("flag").long("flag").action(ArgAction::SetTrue)))
            })
            .unwrap();
        assert_eq!(seen, vec!["up", "notes.new", "notes.list"]);

        let matches = command
            .try_get_matches_from(["my", "notes", "new", "--flag"])
            .unwrap();
        let (group, group_matches) = matches.subcommand().unwrap();
        assert_eq!(group, "notes");
        let (leaf, leaf_matches) = group_matches.subcommand().unwrap();
        assert_eq!(leaf, "new");
        assert!(leaf_matches.get_flag("flag"));
    }

    #[test]
    fn test_group_requires_subcommand() {
        let command = tree()
            .add_subcommands::<Infallible, _>(Command::new("my"), "", &mut |sub, _, _| Ok(sub))
            .unwrap();
        assert!(command.try_get_matches_from(["my", "notes"]).is_err());
    }
}
