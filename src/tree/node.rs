//! Tree nodes and lookups

use super::error::{TreeError, TreeResult};
use super::{Hierarchy, TreeItem};
use indexmap::IndexMap;

/// Behaviour shared by every node of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttrTreeConfig {
    /// Make leaves reachable by name from every node above them.
    pub expose_leaf_items: bool,
}

/// Result of a single-name access on a node.
#[derive(Debug)]
pub enum TreeEntry<'a, T> {
    /// A child group.
    Group(&'a AttrTree<T>),
    /// A leaf item.
    Item(&'a T),
}

impl<'a, T> TreeEntry<'a, T> {
    /// The item, if this entry is a leaf.
    pub fn item(self) -> Option<&'a T> {
        match self {
            TreeEntry::Item(item) => Some(item),
            TreeEntry::Group(_) => None,
        }
    }

    /// The group, if this entry is a group.
    pub fn group(self) -> Option<&'a AttrTree<T>> {
        match self {
            TreeEntry::Group(group) => Some(group),
            TreeEntry::Item(_) => None,
        }
    }
}

/// A named group of items and subgroups.
///
/// Items are inserted under a dotted hierarchy; missing groups are created
/// on the way down. A name is either an item or a group at a given node,
/// never both.
#[derive(Debug, Clone)]
pub struct AttrTree<T> {
    name: String,
    root: bool,
    config: AttrTreeConfig,
    exposed: IndexMap<String, T>,
    children: IndexMap<String, AttrTree<T>>,
    // leaf name -> group paths below this node holding a leaf of that name
    shortcuts: IndexMap<String, Vec<Vec<String>>>,
}

impl<T: TreeItem> AttrTree<T> {
    /// Create a root tree.
    pub fn new(name: impl Into<String>, config: AttrTreeConfig) -> Self {
        Self {
            name: name.into(),
            root: true,
            config,
            exposed: IndexMap::new(),
            children: IndexMap::new(),
            shortcuts: IndexMap::new(),
        }
    }

    fn child(name: &str, config: AttrTreeConfig) -> Self {
        Self {
            root: false,
            ..Self::new(name, config)
        }
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this node is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Node configuration.
    pub fn config(&self) -> AttrTreeConfig {
        self.config
    }

    /// Items stored directly at this node.
    pub fn items(&self) -> impl Iterator<Item = (&str, &T)> {
        self.exposed.iter().map(|(name, item)| (name.as_str(), item))
    }

    /// Direct child groups.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &AttrTree<T>)> {
        self.children.iter().map(|(name, tree)| (name.as_str(), tree))
    }

    /// Insert `item` under `hierarchy`.
    ///
    /// Returns the name of the group the item landed in (`None` when it was
    /// stored at this node) and that group. Nothing is modified when the
    /// insertion fails.
    pub fn add_item(
        &mut self,
        item: T,
        hierarchy: impl Into<Hierarchy>,
    ) -> TreeResult<(Option<String>, &AttrTree<T>)> {
        let hierarchy = hierarchy.into();
        let name = item.tree_name().to_string();
        check_name(&name)?;
        self.check_insert(&name, hierarchy.segments())?;

        let segments = hierarchy.segments();
        let mut node: &mut AttrTree<T> = self;
        for (depth, segment) in segments.iter().enumerate() {
            if node.config.expose_leaf_items {
                node.shortcuts
                    .entry(name.clone())
                    .or_default()
                    .push(segments[depth..].to_vec());
            }
            let config = node.config;
            node = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| AttrTree::child(segment, config));
        }
        node.exposed.insert(name, item);

        Ok((segments.last().cloned(), &*node))
    }

    fn check_insert(&self, name: &str, segments: &[String]) -> TreeResult<()> {
        let mut walked: Vec<&str> = Vec::new();
        let mut node = Some(self);
        for segment in segments {
            let current = match node {
                Some(current) => current,
                None => return Ok(()),
            };
            if current.exposed.contains_key(segment) {
                return Err(TreeError::NameCollision {
                    name: segment.clone(),
                    path: walked.join("."),
                });
            }
            walked.push(segment);
            node = current.children.get(segment);
        }

        if let Some(current) = node {
            if current.children.contains_key(name) {
                return Err(TreeError::NameCollision {
                    name: name.to_string(),
                    path: walked.join("."),
                });
            }
            if current.exposed.contains_key(name) {
                return Err(TreeError::DuplicateItem {
                    name: name.to_string(),
                    path: walked.join("."),
                });
            }
        }
        Ok(())
    }

    /// Group reached by following `segments` from this node.
    pub fn group(&self, segments: &[String]) -> Option<&AttrTree<T>> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Access one name on this node: a leaf, a group, or a leaf exposed
    /// from further down when the tree exposes leaf items.
    pub fn attr(&self, name: &str) -> Option<TreeEntry<'_, T>> {
        if let Some(item) = self.exposed.get(name) {
            return Some(TreeEntry::Item(item));
        }
        if let Some(group) = self.children.get(name) {
            return Some(TreeEntry::Group(group));
        }
        match self.shortcuts.get(name).map(Vec::as_slice) {
            Some([path]) => self
                .group(path)
                .and_then(|group| group.exposed.get(name))
                .map(TreeEntry::Item),
            _ => None,
        }
    }

    /// Entry stored at an exact dotted path.
    pub fn get(&self, path: impl Into<Hierarchy>) -> Option<TreeEntry<'_, T>> {
        let hierarchy = path.into();
        let (last, parents) = hierarchy.segments().split_last()?;
        let node = self.group(parents)?;
        if let Some(item) = node.exposed.get(last) {
            return Some(TreeEntry::Item(item));
        }
        node.children.get(last).map(TreeEntry::Group)
    }

    /// Item stored at an exact dotted path.
    pub fn item(&self, path: impl Into<Hierarchy>) -> Option<&T> {
        self.get(path).and_then(TreeEntry::item)
    }

    /// Find the single item whose full path ends with `query`.
    ///
    /// The query is a suffix of whole segments: `frenchy.Ollie` finds
    /// `bully.frenchy.Ollie` but `bully.Ollie` does not, since the query
    /// segments must be consecutive in the path.
    pub fn find(&self, query: &str) -> TreeResult<(String, &T)> {
        let wanted = Hierarchy::from(query);
        if wanted.is_empty() {
            return Err(TreeError::NotFound(query.to_string()));
        }

        let mut matches: Vec<(String, &T)> = self
            .as_list()
            .into_iter()
            .filter(|(path, _)| {
                let segments: Vec<&str> = path.split('.').collect();
                segments.len() >= wanted.len()
                    && segments[segments.len() - wanted.len()..]
                        .iter()
                        .zip(wanted.segments())
                        .all(|(a, b)| *a == b.as_str())
            })
            .collect();

        match matches.len() {
            0 => Err(TreeError::NotFound(query.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(TreeError::Ambiguous {
                query: query.to_string(),
                candidates: matches.into_iter().map(|(path, _)| path).collect(),
            }),
        }
    }

    /// Item at an exact path, else the single item whose path ends with it.
    pub fn lookup(&self, path: &str) -> TreeResult<&T> {
        match self.item(path) {
            Some(item) => Ok(item),
            None => self.find(path).map(|(_, item)| item),
        }
    }

    /// Every item with its full dotted path, this node's name excluded.
    pub fn as_list(&self) -> Vec<(String, &T)> {
        let mut out = Vec::new();
        let mut reversed: Vec<&str> = Vec::new();
        self.collect_into(&mut reversed, &mut out);
        out
    }

    fn collect_into<'a>(&'a self, reversed: &mut Vec<&'a str>, out: &mut Vec<(String, &'a T)>) {
        for (name, item) in &self.exposed {
            let mut segments = vec![name.as_str()];
            segments.extend(reversed.iter().copied());
            segments.reverse();
            out.push((segments.join("."), item));
        }
        for (name, child) in &self.children {
            reversed.insert(0, name.as_str());
            child.collect_into(reversed, out);
            reversed.remove(0);
        }
    }

    /// Every item by leaf name. A later leaf replaces an earlier one with
    /// the same name.
    pub fn all_items(&self) -> IndexMap<String, &T> {
        self.as_list()
            .into_iter()
            .map(|(path, item)| {
                let leaf = path.rsplit('.').next().unwrap_or_default().to_string();
                (leaf, item)
            })
            .collect()
    }

    /// Number of items in the whole subtree.
    pub fn len(&self) -> usize {
        self.exposed.len() + self.children.values().map(AttrTree::len).sum::<usize>()
    }

    /// Whether the subtree holds no item.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_name(name: &str) -> TreeResult<()> {
    if name.is_empty() || name.contains('.') {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}
