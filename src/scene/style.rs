//! Link draw styles and selection highlighting

use crate::config::NeuronFocus;
use crate::connectivity::ConnectivityPattern;
use crate::types::{Link, NeuronSide, Rgba};

/// Colour and line width of one link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkStyle {
    pub colour: Rgba,
    pub width: f32,
}

impl LinkStyle {
    pub const fn new(r: f32, g: f32, b: f32, a: f32, width: f32) -> Self {
        Self {
            colour: Rgba::new(r, g, b, a),
            width,
        }
    }

    pub fn scaled(self, line_scale: f32) -> Self {
        Self {
            width: self.width * line_scale,
            ..self
        }
    }
}

pub const ONE_TO_ONE_STYLE: LinkStyle = LinkStyle::new(0.0, 0.0, 1.0, 0.8, 1.5);
pub const ALL_TO_ALL_STYLE: LinkStyle = LinkStyle::new(0.0, 0.0, 1.0, 0.2, 1.5);
pub const FIXED_PROBABILITY_STYLE: LinkStyle = LinkStyle::new(0.0, 0.0, 0.0, 0.1, 1.0);
pub const EXPLICIT_STYLE: LinkStyle = LinkStyle::new(0.0, 0.0, 0.0, 0.1, 1.0);
pub const EXACT_ROW_STYLE: LinkStyle = LinkStyle::new(1.0, 0.0, 0.0, 1.0, 2.0);
pub const SHARED_ENDPOINT_STYLE: LinkStyle = LinkStyle::new(0.0, 1.0, 0.0, 0.8, 1.5);
pub const NEURON_FOCUS_STYLE: LinkStyle = LinkStyle::new(0.0, 1.0, 0.0, 1.0, 1.5);

/// Alpha of metric-coloured explicit links
const METRIC_ALPHA: f32 = 1.0;

/// Base style of every link of `pattern`
pub fn pattern_style(pattern: &ConnectivityPattern) -> LinkStyle {
    match pattern {
        ConnectivityPattern::OneToOne => ONE_TO_ONE_STYLE,
        ConnectivityPattern::AllToAll => ALL_TO_ALL_STYLE,
        ConnectivityPattern::FixedProbability { .. } => FIXED_PROBABILITY_STYLE,
        ConnectivityPattern::Explicit(_) => EXPLICIT_STYLE,
    }
}

/// Metric range of a link list, `None` when empty or flat
pub fn metric_range(links: &[Link]) -> Option<(f32, f32)> {
    let mut iter = links.iter().map(|l| l.metric).filter(|m| m.is_finite());
    let first = iter.next()?;
    let (min, max) = iter.fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m)));
    if max > min {
        Some((min, max))
    } else {
        None
    }
}

/// Blue intensity proportional to the metric's position in `range`
pub fn metric_style(metric: f32, range: Option<(f32, f32)>) -> LinkStyle {
    let blue = match range {
        Some((min, max)) if metric.is_finite() => ((metric - min) / (max - min)).clamp(0.0, 1.0),
        _ => 0.0,
    };
    LinkStyle::new(0.0, 0.0, blue, METRIC_ALPHA, EXPLICIT_STYLE.width)
}

/// Column of a connection table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkColumn {
    Source,
    Destination,
    Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectedCell {
    pub row: usize,
    pub column: LinkColumn,
}

/// Cells picked in the connection table of the selected connection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSelection {
    cells: Vec<SelectedCell>,
}

impl TableSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, row: usize, column: LinkColumn) {
        let cell = SelectedCell { row, column };
        if !self.cells.contains(&cell) {
            self.cells.push(cell);
        }
    }

    pub fn cells(&self) -> &[SelectedCell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// How strongly a link is highlighted, higher tiers win
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HighlightTier {
    None,
    SharedEndpoint,
    NeuronFocus,
    ExactRow,
}

impl HighlightTier {
    pub fn style(self) -> Option<LinkStyle> {
        match self {
            HighlightTier::None => None,
            HighlightTier::SharedEndpoint => Some(SHARED_ENDPOINT_STYLE),
            HighlightTier::NeuronFocus => Some(NEURON_FOCUS_STYLE),
            HighlightTier::ExactRow => Some(EXACT_ROW_STYLE),
        }
    }
}

/// Highlight of link `index` of `links` under the table selection and
/// neuron focus.
///
/// A selected cell highlights its own row exactly. A selected source cell
/// also highlights every link leaving the same neuron, a destination cell
/// every link arriving at the same neuron.
pub fn classify_link(
    index: usize,
    links: &[Link],
    selection: &TableSelection,
    focus: Option<NeuronFocus>,
) -> HighlightTier {
    let Some(link) = links.get(index) else {
        return HighlightTier::None;
    };
    let mut tier = HighlightTier::None;
    for cell in selection.cells() {
        if cell.row == index {
            return HighlightTier::ExactRow;
        }
        let Some(row) = links.get(cell.row) else {
            continue;
        };
        let shared = match cell.column {
            LinkColumn::Source => row.src == link.src,
            LinkColumn::Destination => row.dst == link.dst,
            LinkColumn::Metric => false,
        };
        if shared {
            tier = tier.max(HighlightTier::SharedEndpoint);
        }
    }
    if let Some(focus) = focus {
        let hit = match focus.side {
            NeuronSide::Source => link.src == focus.index,
            NeuronSide::Destination => link.dst == focus.index,
        };
        if hit {
            tier = tier.max(HighlightTier::NeuronFocus);
        }
    }
    tier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<Link> {
        vec![Link::new(0, 1), Link::new(0, 2), Link::new(1, 2), Link::new(3, 3)]
    }

    #[test]
    fn test_exact_row_beats_shared_endpoint() {
        let mut sel = TableSelection::new();
        sel.select(0, LinkColumn::Source);
        let links = links();
        assert_eq!(classify_link(0, &links, &sel, None), HighlightTier::ExactRow);
        assert_eq!(classify_link(1, &links, &sel, None), HighlightTier::SharedEndpoint);
        assert_eq!(classify_link(2, &links, &sel, None), HighlightTier::None);
    }

    #[test]
    fn test_destination_column_shares_destination() {
        let mut sel = TableSelection::new();
        sel.select(1, LinkColumn::Destination);
        let links = links();
        assert_eq!(classify_link(2, &links, &sel, None), HighlightTier::SharedEndpoint);
        assert_eq!(classify_link(0, &links, &sel, None), HighlightTier::None);
    }

    #[test]
    fn test_metric_column_only_highlights_row() {
        let mut sel = TableSelection::new();
        sel.select(0, LinkColumn::Metric);
        let links = links();
        assert_eq!(classify_link(1, &links, &sel, None), HighlightTier::None);
    }

    #[test]
    fn test_neuron_focus() {
        let sel = TableSelection::new();
        let focus = Some(NeuronFocus {
            side: NeuronSide::Destination,
            index: 2,
        });
        let links = links();
        assert_eq!(classify_link(1, &links, &sel, focus), HighlightTier::NeuronFocus);
        assert_eq!(classify_link(3, &links, &sel, focus), HighlightTier::None);
        assert_eq!(classify_link(99, &links, &sel, focus), HighlightTier::None);
    }

    #[test]
    fn test_stale_selection_rows_are_ignored() {
        let mut sel = TableSelection::new();
        sel.select(42, LinkColumn::Source);
        assert_eq!(classify_link(0, &links(), &sel, None), HighlightTier::None);
    }

    #[test]
    fn test_metric_style() {
        let links = vec![Link::with_metric(0, 0, 1.0), Link::with_metric(0, 1, 3.0)];
        let range = metric_range(&links);
        assert_eq!(range, Some((1.0, 3.0)));
        assert_eq!(metric_style(2.0, range).colour.b, 0.5);
        assert_eq!(metric_style(2.0, None).colour.b, 0.0);
        assert_eq!(metric_range(&[Link::new(0, 0)]), None);
    }

    #[test]
    fn test_pattern_styles() {
        assert_eq!(pattern_style(&ConnectivityPattern::OneToOne), ONE_TO_ONE_STYLE);
        assert_eq!(pattern_style(&ConnectivityPattern::AllToAll).colour.a, 0.2);
        assert_eq!(ONE_TO_ONE_STYLE.scaled(2.0).width, 3.0);
    }
}
