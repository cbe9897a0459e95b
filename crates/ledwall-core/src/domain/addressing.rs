//! Canvas-to-chain address translation.
//!
//! # How the panels are wired (for beginners)
//!
//! The panel driver does not know about the grid on the wall.  It sees
//! `channel_count` parallel chains, each a horizontal strip of
//! `panels_per_channel` panels, and expects one frame in which chain `k`
//! occupies pixel rows `k * panel_size .. (k + 1) * panel_size`:
//!
//! ```text
//!            position 0   position 1   position 2   position 3
//! chain 0  [ panel 1   ][ panel 2   ][ panel 3   ][ panel 4   ]
//! chain 1  [ panel 5   ][ panel 6   ][ panel 7   ][ panel 8   ]
//! ```
//!
//! Panel `m` therefore sits on chain `(m - 1) / panels_per_channel` at
//! position `(m - 1) % panels_per_channel`, whatever cell it occupies on the
//! wall.  [`AddressMap`] pairs that physical square with the panel's square
//! on the virtual canvas.

use super::geometry::Rect;
use super::layout::{PanelId, PanelLayout};

/// Location of a panel on the hardware chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainAddress {
    /// Which parallel chain, `0..channel_count`.
    pub chain: u32,
    /// Position along the chain, `0..panels_per_channel`.
    pub position: u32,
}

impl ChainAddress {
    /// Chain address of panel `id` when every chain holds `panels_per_channel`
    /// panels.
    ///
    /// `id` must be at least 1 and `panels_per_channel` non-zero; both are
    /// guaranteed for ids coming out of a validated [`PanelLayout`].
    pub fn of(id: PanelId, panels_per_channel: u32) -> Self {
        let index = id - 1;
        Self {
            chain: index / panels_per_channel,
            position: index % panels_per_channel,
        }
    }

    /// Inverse of [`ChainAddress::of`].
    pub fn panel_id(&self, panels_per_channel: u32) -> PanelId {
        self.chain * panels_per_channel + self.position + 1
    }

    /// Destination square in the chained frame buffer.
    pub fn destination(&self, panel_size: u32) -> Rect {
        Rect::new(
            self.position * panel_size,
            self.chain * panel_size,
            panel_size,
            panel_size,
        )
    }
}

/// Both ends of one panel's per-frame copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelAddress {
    pub panel: PanelId,
    pub chain: ChainAddress,
    /// Square on the virtual canvas.
    pub source: Rect,
    /// Square in the chained frame buffer.
    pub destination: Rect,
}

/// Precomputed [`PanelAddress`] for every panel of a layout, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    panel_size: u32,
    channel_count: u32,
    panels_per_channel: u32,
    addresses: Vec<PanelAddress>,
}

impl AddressMap {
    /// Builds the map from a validated layout.
    pub fn new(layout: &PanelLayout) -> Self {
        let panel_size = layout.panel_size();
        let panels_per_channel = layout.panels_per_channel();

        let mut addresses: Vec<PanelAddress> = layout
            .panels()
            .map(|(cell, panel)| {
                let chain = ChainAddress::of(panel, panels_per_channel);
                PanelAddress {
                    panel,
                    chain,
                    source: Rect::from_cell(cell, panel_size),
                    destination: chain.destination(panel_size),
                }
            })
            .collect();
        addresses.sort_by_key(|address| address.panel);

        tracing::debug!(
            panels = addresses.len(),
            channels = layout.channel_count(),
            panels_per_channel,
            "built panel address map"
        );

        Self {
            panel_size,
            channel_count: layout.channel_count(),
            panels_per_channel,
            addresses,
        }
    }

    /// Address of panel `id`, or `None` outside `1..=panel_count`.
    pub fn address(&self, id: PanelId) -> Option<&PanelAddress> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.addresses.get(index)
    }

    /// Panel wired at `chain`, if that chain slot exists.
    pub fn panel_at(&self, chain: ChainAddress) -> Option<PanelId> {
        if chain.chain >= self.channel_count || chain.position >= self.panels_per_channel {
            return None;
        }
        Some(chain.panel_id(self.panels_per_channel))
    }

    /// All addresses in ascending panel id order.
    pub fn iter(&self) -> std::slice::Iter<'_, PanelAddress> {
        self.addresses.iter()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn panel_size(&self) -> u32 {
        self.panel_size
    }

    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    pub fn panels_per_channel(&self) -> u32 {
        self.panels_per_channel
    }

    /// Size of the chained frame buffer: `(panels_per_channel * size,
    /// channel_count * size)`.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            self.panels_per_channel * self.panel_size,
            self.channel_count * self.panel_size,
        )
    }
}

impl<'a> IntoIterator for &'a AddressMap {
    type Item = &'a PanelAddress;
    type IntoIter = std::slice::Iter<'a, PanelAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
