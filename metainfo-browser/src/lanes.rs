//! Breadcrumb navigation over adaptors.
//!
//! The navigator holds an ordered sequence of lanes `[L0, .., Ln]`, the path
//! from the document root to the focused node. `L0` always holds the root
//! adaptor. Every transition either succeeds completely or leaves the lanes
//! untouched.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::Serialize;
use serde_json::Value;

use crate::{
    adaptor::{Adaptor, is_present},
    config::PaginationConfig,
    data::ChildKey,
    error::NavError,
    pager::{Direction, ListPager},
    render::{ListView, RenderNode, ViewFlags},
    source::{Page, PageRequest},
    units::UnitContext,
};

/// Identity of a lane. Never reused within a navigator, so responses for a
/// discarded lane cannot land on a newer lane at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LaneId(u64);

#[cfg(test)]
impl LaneId {
    pub(crate) fn for_tests(id: u64) -> Self {
        Self(id)
    }
}

/// One step of the breadcrumb path.
#[derive(Debug, Clone)]
pub struct Lane {
    id: LaneId,
    /// The key that led here from the previous lane; `None` for `L0`.
    key: Option<String>,
    adaptor: Adaptor,
    /// Key of the child shown in the next lane.
    selected: Option<String>,
    pagers: BTreeMap<String, ListPager>,
    /// Elements of repeating sub-sections fetched from the document source.
    fetched: HashMap<String, BTreeMap<usize, Arc<Value>>>,
}

impl Lane {
    pub fn id(&self) -> LaneId {
        self.id
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn adaptor(&self) -> &Adaptor {
        &self.adaptor
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn pager(&self, list: &str) -> Option<&ListPager> {
        self.pagers.get(list)
    }

    /// Resolve a child key, preferring fetched list elements over the
    /// local document.
    pub fn child(&self, key: &str) -> Result<Adaptor, NavError> {
        let key: ChildKey = key.parse()?;
        if let Some(index) = key.index
            && let Some(value) = self
                .fetched
                .get(&key.name)
                .and_then(|items| items.get(&index))
        {
            return self.adaptor.fetched_item(&key.name, index, value.clone());
        }
        self.adaptor.child(&key)
    }

    /// The lane's adaptor render plus the visible window of every long list.
    /// List lengths come from the pagers, which know about remote elements.
    pub fn render(&self, flags: &ViewFlags, units: &UnitContext) -> RenderNode {
        let mut node = self.adaptor.render(flags, units);
        let mut lists = Vec::new();
        for child in node.children.iter_mut().filter(|c| !c.disabled) {
            let Some(pager) = self.pagers.get(&child.key) else {
                continue;
            };
            child.count = Some(pager.len());
            lists.push(ListView {
                name: child.key.clone(),
                len: pager.len(),
                items: pager
                    .visible()
                    .map(|i| ChildKey::indexed(&child.key, i).to_string())
                    .collect(),
                hidden: pager.hidden(),
                controls: pager.has_controls(),
            });
        }
        node.lists = lists;
        node
    }

    fn is_available(&self, list: &str, index: usize) -> bool {
        let local = match self.adaptor.value().get(list) {
            Some(Value::Array(items)) => index < items.len(),
            Some(lone) => index == 0 && is_present(lone),
            None => false,
        };
        local
            || self
                .fetched
                .get(list)
                .is_some_and(|items| items.contains_key(&index))
    }

    fn list_reference(&self, list: &str) -> String {
        self.adaptor.path().join(ChildKey::new(list)).to_reference()
    }
}

/// The lanes from the document root to the focused node, plus the paging
/// settings every new lane starts with.
#[derive(Debug, Clone)]
pub struct Navigator {
    lanes: Vec<Lane>,
    pagination: PaginationConfig,
    next_lane: u64,
}

impl Navigator {
    /// A navigator in its initial state `[L0]`.
    pub fn new(root: Adaptor, pagination: PaginationConfig) -> Self {
        let mut nav = Self {
            lanes: Vec::new(),
            pagination,
            next_lane: 0,
        };
        let lane = nav.make_lane(None, root);
        nav.lanes.push(lane);
        nav
    }

    fn make_lane(&mut self, key: Option<String>, adaptor: Adaptor) -> Lane {
        let id = LaneId(self.next_lane);
        self.next_lane += 1;
        let pagers = adaptor
            .repeating_children()
            .into_iter()
            .map(|(name, len)| {
                let pager = ListPager::new(
                    len,
                    self.pagination.top,
                    self.pagination.bottom,
                    self.pagination.page,
                );
                (name, pager)
            })
            .collect();
        Lane {
            id,
            key,
            adaptor,
            selected: None,
            pagers,
            fetched: HashMap::new(),
        }
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Always false: `L0` is never removed.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// The last lane.
    pub fn focus(&self) -> &Lane {
        &self.lanes[self.lanes.len() - 1]
    }

    pub fn lane(&self, index: usize) -> Result<&Lane, NavError> {
        self.lanes.get(index).ok_or(NavError::LaneOutOfRange(index))
    }

    /// Breadcrumb of the keys pushed so far, `run:0/system:1`.
    pub fn path(&self) -> String {
        self.lanes
            .iter()
            .filter_map(Lane::key)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Append the lane for `key` of the focused lane.
    pub fn push(&mut self, key: &str) -> Result<&Lane, NavError> {
        let index = self.lanes.len() - 1;
        self.select(index, key)
    }

    /// Replace everything after lane `index` with the lane for `key` of
    /// lane `index`.
    pub fn select(&mut self, index: usize, key: &str) -> Result<&Lane, NavError> {
        let child = self.lane(index)?.child(key).inspect_err(|err| {
            warn!("rejected `{key}` at lane {index}: {err}");
        })?;
        debug!("lane {} -> {}", index + 1, child.path());
        let lane = self.make_lane(Some(key.to_string()), child);
        self.lanes.truncate(index + 1);
        self.lanes[index].selected = Some(key.to_string());
        self.lanes.push(lane);
        Ok(self.focus())
    }

    /// Discard the focused lane. `L0` stays.
    pub fn pop(&mut self) -> Option<Lane> {
        if self.lanes.len() == 1 {
            return None;
        }
        let lane = self.lanes.pop();
        if let Some(last) = self.lanes.last_mut() {
            last.selected = None;
        }
        lane
    }

    /// Keep lanes `0..=index`, discarding the rest.
    pub fn truncate_to(&mut self, index: usize) -> Result<(), NavError> {
        if index >= self.lanes.len() {
            return Err(NavError::LaneOutOfRange(index));
        }
        self.lanes.truncate(index + 1);
        self.lanes[index].selected = None;
        Ok(())
    }

    /// Back to `[L0]`.
    pub fn reset(&mut self) {
        self.lanes.truncate(1);
        self.lanes[0].selected = None;
    }

    /// Replace the lanes after `L0` with the lanes for a `/`-separated path.
    /// Fails without changes if any segment fails.
    pub fn navigate(&mut self, path: &str) -> Result<&Lane, NavError> {
        let keys: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut root = self.lanes[0].clone();
        root.selected = None;
        let mut chain = vec![root];
        for key in &keys {
            let Some(last) = chain.last() else {
                break;
            };
            let child = last.child(key).inspect_err(|err| {
                warn!("rejected path `{path}` at `{key}`: {err}");
            })?;
            let lane = self.make_lane(Some(key.to_string()), child);
            if let Some(last) = chain.last_mut() {
                last.selected = Some(key.to_string());
            }
            chain.push(lane);
        }
        self.lanes = chain;
        Ok(self.focus())
    }

    /// Whether every lane's adaptor is a child of the previous lane's.
    pub fn check_invariant(&self) -> bool {
        self.lanes
            .windows(2)
            .all(|w| w[1].adaptor.parent() == Some(w[0].adaptor.id()))
    }

    /// Render the focused lane.
    pub fn render(&self, flags: &ViewFlags, units: &UnitContext) -> RenderNode {
        self.focus().render(flags, units)
    }

    /// Grow a list window of lane `index`. Returns a page request when the
    /// newly exposed elements are not available locally.
    pub fn expand(
        &mut self,
        index: usize,
        list: &str,
        direction: Direction,
    ) -> Result<Option<PageRequest>, NavError> {
        let lane = self
            .lanes
            .get_mut(index)
            .ok_or(NavError::LaneOutOfRange(index))?;
        let Some(pager) = lane.pagers.get_mut(list) else {
            return Err(NavError::UnknownProperty {
                section: lane.adaptor.title(),
                key: list.to_string(),
            });
        };
        let exposed = pager.expand(direction);
        let missing: Vec<usize> = exposed.filter(|i| !lane.is_available(list, *i)).collect();
        let (Some(first), Some(last)) = (missing.first(), missing.last()) else {
            return Ok(None);
        };
        Ok(Some(self.page_request(index, list, *first, last - first + 1)?))
    }

    /// Explicitly request elements `offset..offset + limit` of a list.
    pub fn page_request(
        &self,
        index: usize,
        list: &str,
        offset: usize,
        limit: usize,
    ) -> Result<PageRequest, NavError> {
        let lane = self.lane(index)?;
        let request = PageRequest {
            lane: lane.id,
            list: list.to_string(),
            path: lane.list_reference(list),
            offset,
            limit,
        };
        debug!(
            "page request {:?} {} [{}, {})",
            lane.id,
            request.path,
            offset,
            offset + limit
        );
        Ok(request)
    }

    /// Request the first run of visible elements of a list that are neither
    /// in the document nor fetched yet.
    ///
    /// A page reporting a larger total moves the bottom window onto elements
    /// nobody asked for; callers drain this after every [`apply_page`] until
    /// it returns `None`.
    ///
    /// [`apply_page`]: Navigator::apply_page
    pub fn pending_request(
        &self,
        index: usize,
        list: &str,
    ) -> Result<Option<PageRequest>, NavError> {
        let lane = self.lane(index)?;
        let Some(pager) = lane.pagers.get(list) else {
            return Ok(None);
        };
        let mut missing = pager.visible().filter(|i| !lane.is_available(list, *i));
        let Some(first) = missing.next() else {
            return Ok(None);
        };
        let mut last = first;
        for i in missing {
            if i != last + 1 {
                break;
            }
            last = i;
        }
        Ok(Some(self.page_request(index, list, first, last - first + 1)?))
    }

    /// Store a fetched page on the lane that requested it.
    ///
    /// Returns `false`, changing nothing, when that lane has been discarded
    /// in the meantime. Follow up with [`pending_request`] when the page
    /// changed the list length.
    ///
    /// [`pending_request`]: Navigator::pending_request
    pub fn apply_page(&mut self, request: &PageRequest, page: Page) -> bool {
        let Some(lane) = self.lanes.iter_mut().find(|l| l.id == request.lane) else {
            warn!(
                "dropping page for discarded lane {:?} ({})",
                request.lane, request.path
            );
            return false;
        };
        let items = lane.fetched.entry(request.list.clone()).or_default();
        for (i, item) in page.items.into_iter().enumerate() {
            items.insert(request.offset + i, Arc::new(item));
        }
        let pagination = &self.pagination;
        let pager = lane.pagers.entry(request.list.clone()).or_insert_with(|| {
            ListPager::new(
                page.total,
                pagination.top,
                pagination.bottom,
                pagination.page,
            )
        });
        if pager.len() != page.total {
            pager.set_len(page.total);
        }
        true
    }
}
