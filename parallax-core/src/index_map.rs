//! # View Index Maps
//!
//! An index map tells the display which content view each physical view slot
//! shows. Panels usually expose more slots than there are content views, so
//! views are replicated into contiguous bands, optionally separated by blank
//! slots that hide crosstalk between neighboring views.
//!
//! ```text
//!   35 slots, 2 content views, delimiter 0.1, eye area 0.4
//!
//!   ░░ 1111111111111111 ░░░ 00000000000000 ░░
//!   └┘ └──── 14 ─────┘  └┘  └──── 14 ────┘ └┘
//!   2                   3                  2      ░ = blank
//! ```
//!
//! A "yoyo" map runs the distribution forward over a prefix of the slots and
//! mirrored over the rest, which moves the symmetry point of the crosstalk
//! bands away from the center.
//!
//! Named maps live in an [`IndexMapCache`] owned by the caller.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw value of a blank slot in the host lookup table.
pub const BLANK_VIEW: u32 = 250;

/// Number of physical slots of the generated default maps.
pub const DEFAULT_MAP_SLOTS: usize = 35;

/// One physical view slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSlot {
    /// Shows black.
    Blank,
    /// Shows the given content view.
    View(u32),
}

impl ViewSlot {
    /// Raw lookup-table value, with [`BLANK_VIEW`] for blanks.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Blank => BLANK_VIEW,
            Self::View(view) => view,
        }
    }

    /// Parse a raw lookup-table value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        if raw == BLANK_VIEW {
            Self::Blank
        } else {
            Self::View(raw)
        }
    }

    /// Whether the slot is blank.
    #[must_use]
    pub const fn is_blank(self) -> bool {
        matches!(self, Self::Blank)
    }
}

/// Mapping from physical view slots to content views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexMap {
    slots: Vec<ViewSlot>,
}

impl IndexMap {
    /// Wrap an explicit slot sequence.
    #[must_use]
    pub fn new(slots: Vec<ViewSlot>) -> Self {
        Self { slots }
    }

    /// Build from raw lookup-table values.
    #[must_use]
    pub fn from_raw(raw: &[u32]) -> Self {
        Self::new(raw.iter().copied().map(ViewSlot::from_raw).collect())
    }

    /// Raw lookup table for the rendering host.
    #[must_use]
    pub fn to_raw(&self) -> Vec<u32> {
        self.slots.iter().map(|slot| slot.to_raw()).collect()
    }

    /// The slots in order.
    #[must_use]
    pub fn slots(&self) -> &[ViewSlot] {
        &self.slots
    }

    /// Slot at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ViewSlot> {
        self.slots.get(index).copied()
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of blank slots.
    #[must_use]
    pub fn blank_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_blank()).count()
    }
}

/// Spacing of the automatic distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexMapSettings {
    /// Share of slots used for blank delimiters.
    pub delimiter_fraction: f64,
    /// Share of slots given to each eye in a two-view map.
    pub eye_area_fraction: f64,
}

impl IndexMapSettings {
    /// No delimiters; each eye gets half of the slots.
    #[must_use]
    pub const fn without_delimiter() -> Self {
        Self {
            delimiter_fraction: 0.0,
            eye_area_fraction: 0.5,
        }
    }
}

impl Default for IndexMapSettings {
    fn default() -> Self {
        Self {
            delimiter_fraction: 0.1,
            eye_area_fraction: 0.4,
        }
    }
}

/// Named index maps, owned by whoever drives the generator.
#[derive(Debug, Clone, Default)]
pub struct IndexMapCache {
    maps: HashMap<String, IndexMap>,
}

impl IndexMapCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding the built-in maps.
    ///
    /// `A` to `E` are generated over [`DEFAULT_MAP_SLOTS`] slots without
    /// delimiters for 2, 6, 8, 9 and 16 content views. The remaining maps are
    /// fixed layouts for specific panels.
    #[must_use]
    pub fn with_defaults() -> Self {
        let generator = IndexMapGenerator::with_settings(IndexMapSettings::without_delimiter());
        let mut cache = Self::new();

        for (name, content_views) in [("A", 2), ("B", 6), ("C", 8), ("D", 9), ("E", 16)] {
            let map = generator.generate(DEFAULT_MAP_SLOTS, content_views, 1.0, false, false);
            cache.insert(name, map);
        }

        cache.insert("S1D", stereo_layout(9, 8, 1));
        cache.insert("S2D", stereo_layout(9, 7, 3));
        cache.insert("S3D", stereo_layout(5, 11, 3));
        cache.insert("S4D", stereo_layout(6, 11, 1));
        cache.insert("S6D", stereo_layout(2, 10, 1));

        for name in ["05A", "05N"] {
            cache.insert(name, banded_layout(5, 3));
        }
        for name in ["05C", "05O", "05P", "05R"] {
            cache.insert(name, banded_layout(5, 1));
        }
        cache.insert("05Q", banded_layout(5, 5));
        cache.insert("07A", banded_layout(7, 3));
        cache.insert("07D", banded_layout(7, 5));
        for name in ["08A", "A8A"] {
            cache.insert(name, banded_layout(8, 3));
        }
        for name in ["08B", "08O", "A8B", "A8O"] {
            cache.insert(name, banded_layout(8, 1));
        }
        for name in ["08D", "08Q"] {
            cache.insert(name, banded_layout(8, 5));
        }
        cache.insert("120views", banded_layout(120, 1));

        cache
    }

    /// Insert or replace a map, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, map: IndexMap) -> Option<IndexMap> {
        self.maps.insert(name.into(), map)
    }

    /// Map stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexMap> {
        self.maps.get(name)
    }

    /// Whether a map is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    /// Remove and return the map stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<IndexMap> {
        self.maps.remove(name)
    }

    /// Stored names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of stored maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

/// `lead` blanks, `eye` slots of view 0, `gap` blanks, `eye` slots of view 1,
/// `lead` blanks.
fn stereo_layout(lead: usize, eye: usize, gap: usize) -> IndexMap {
    let mut slots = Vec::with_capacity(2 * lead + 2 * eye + gap);
    push_run(&mut slots, ViewSlot::Blank, lead);
    push_run(&mut slots, ViewSlot::View(0), eye);
    push_run(&mut slots, ViewSlot::Blank, gap);
    push_run(&mut slots, ViewSlot::View(1), eye);
    push_run(&mut slots, ViewSlot::Blank, lead);
    IndexMap::new(slots)
}

fn push_run(map: &mut Vec<ViewSlot>, slot: ViewSlot, count: usize) {
    map.resize(map.len() + count, slot);
}

/// Views `0..views` in ascending order, each repeated `width` times.
fn banded_layout(views: u32, width: usize) -> IndexMap {
    let mut slots = Vec::new();
    for view in 0..views {
        push_run(&mut slots, ViewSlot::View(view), width);
    }
    IndexMap::new(slots)
}

/// Generates index maps and keeps named results in an [`IndexMapCache`].
#[derive(Debug, Clone, Default)]
pub struct IndexMapGenerator {
    settings: IndexMapSettings,
    cache: IndexMapCache,
}

impl IndexMapGenerator {
    /// Create a generator with default settings and an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator with custom settings and an empty cache.
    #[must_use]
    pub fn with_settings(settings: IndexMapSettings) -> Self {
        Self::with_cache(settings, IndexMapCache::new())
    }

    /// Create a generator that stores named maps in `cache`.
    #[must_use]
    pub fn with_cache(settings: IndexMapSettings, cache: IndexMapCache) -> Self {
        Self { settings, cache }
    }

    /// Distribution settings.
    #[must_use]
    pub const fn settings(&self) -> &IndexMapSettings {
        &self.settings
    }

    /// Generate a map of `available_views` slots for `content_views` views.
    ///
    /// `yoyo_start` (clamped to `[0, 1]`) is the share of slots generated
    /// forward before the distribution is mirrored; `1.0` disables the yoyo.
    /// `invert` reverses the slot order and `invert_indices` maps each view
    /// `v` to `content_views - 1 - v`.
    ///
    /// With no content views every slot is blank.
    ///
    /// # Panics
    ///
    /// Panics if `content_views` is not below [`BLANK_VIEW`].
    #[must_use]
    pub fn generate(
        &self,
        available_views: usize,
        content_views: usize,
        yoyo_start: f64,
        invert: bool,
        invert_indices: bool,
    ) -> IndexMap {
        assert!(
            content_views < BLANK_VIEW as usize,
            "{content_views} content views collide with the blank marker {BLANK_VIEW}"
        );

        let yoyo_start = if yoyo_start.is_nan() {
            1.0
        } else {
            yoyo_start.clamp(0.0, 1.0)
        };

        if available_views <= 1 || content_views == 1 {
            return IndexMap::new(vec![ViewSlot::View(0); available_views]);
        }
        if content_views == 0 {
            return IndexMap::new(vec![ViewSlot::Blank; available_views]);
        }

        let mut slots = if yoyo_start < 1.0 {
            let forward = floor_slots(available_views, yoyo_start);
            let mirrored = available_views - forward;
            let sub_settings = IndexMapSettings::without_delimiter();

            let mut slots = sub_distribution(forward, content_views, false, &sub_settings);
            slots.extend(sub_distribution(mirrored, content_views, true, &sub_settings));
            slots
        } else {
            distribute(available_views, content_views, invert, &self.settings)
        };

        if invert_indices {
            for slot in &mut slots {
                if let ViewSlot::View(view) = slot {
                    *view = view_index(content_views - 1) - *view;
                }
            }
        }

        IndexMap::new(slots)
    }

    /// Generate a map and store it under `name`, replacing any previous map.
    ///
    /// # Panics
    ///
    /// Panics under the same condition as [`IndexMapGenerator::generate`].
    pub fn generate_named(
        &mut self,
        name: impl Into<String>,
        available_views: usize,
        content_views: usize,
        yoyo_start: f64,
        invert: bool,
        invert_indices: bool,
    ) -> &IndexMap {
        let name = name.into();
        let map = self.generate(
            available_views,
            content_views,
            yoyo_start,
            invert,
            invert_indices,
        );
        tracing::debug!(
            "Generated index map '{}' ({} slots, {} content views, {} blank)",
            name,
            map.len(),
            content_views,
            map.blank_count()
        );

        match self.cache.maps.entry(name) {
            Entry::Occupied(mut entry) => {
                entry.insert(map);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(map),
        }
    }

    /// Map stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexMap> {
        self.cache.get(name)
    }

    /// The cache of named maps.
    #[must_use]
    pub const fn cache(&self) -> &IndexMapCache {
        &self.cache
    }

    /// Give the cache back to the caller.
    #[must_use]
    pub fn into_cache(self) -> IndexMapCache {
        self.cache
    }
}

#[allow(clippy::cast_possible_truncation)] // content views are below BLANK_VIEW
fn view_index(index: usize) -> u32 {
    index as u32
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)] // slot counts are small and the product is floored at zero
fn floor_slots(slots: usize, fraction: f64) -> usize {
    let value = (slots as f64 * fraction).floor();
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value as usize
    }
}

fn sub_distribution(
    slots: usize,
    content_views: usize,
    invert: bool,
    settings: &IndexMapSettings,
) -> Vec<ViewSlot> {
    if slots <= 1 {
        return vec![ViewSlot::View(0); slots];
    }
    distribute(slots, content_views, invert, settings)
}

/// Automatic distribution of `slots` over `content_views` (at least 2).
#[allow(clippy::float_cmp)] // only an exact zero delimiter collapses blanks
fn distribute(
    slots: usize,
    content_views: usize,
    invert: bool,
    settings: &IndexMapSettings,
) -> Vec<ViewSlot> {
    let mut map = Vec::with_capacity(slots);

    if content_views == 2 {
        let delimiter = floor_slots(slots, settings.delimiter_fraction);
        let eye = floor_slots(slots, settings.eye_area_fraction);
        let remaining = slots.saturating_sub(delimiter + 2 * eye);
        let start = remaining / 2;
        let end = remaining - start;

        push_run(&mut map, ViewSlot::Blank, start);
        push_run(&mut map, ViewSlot::View(1), eye);
        push_run(&mut map, ViewSlot::Blank, delimiter);
        push_run(&mut map, ViewSlot::View(0), eye);
        push_run(&mut map, ViewSlot::Blank, end);
    } else {
        let edge = floor_slots(slots, settings.delimiter_fraction / 2.0);
        let inner = slots.saturating_sub(2 * edge);
        let per_view = inner / content_views;
        let mut leftover = inner % content_views;

        push_run(&mut map, ViewSlot::Blank, edge);
        for bucket in 0..content_views {
            let mut width = per_view;
            if leftover > 0 {
                width += 1;
                leftover -= 1;
            }
            let view = ViewSlot::View(view_index(content_views - 1 - bucket));
            push_run(&mut map, view, width);
        }
        push_run(&mut map, ViewSlot::Blank, edge);
    }

    // oversized fractions truncate, rounding gaps fill with view 0
    map.truncate(slots);
    map.resize(slots, ViewSlot::View(0));

    if invert {
        map.reverse();
    }

    if settings.delimiter_fraction == 0.0 {
        collapse_blanks(&mut map);
    }

    map
}

/// Replace each blank with its left neighbor (view 0 at the start).
fn collapse_blanks(map: &mut [ViewSlot]) {
    let mut previous = ViewSlot::View(0);
    for slot in map.iter_mut() {
        if slot.is_blank() {
            *slot = previous;
        }
        previous = *slot;
    }
}
