//! Pivots: the three key positions of an entry, and orderings over them.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// One of the three key positions of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pivot {
    /// `layerId`
    Layer,
    /// `areaId`
    Area,
    /// `filterId`
    Filter,
}

impl Pivot {
    /// All pivots in wildcard resolution order.
    ///
    /// Area and filter expansion both need a concrete layer, so the layer
    /// pivot always resolves first.
    pub const RESOLUTION_ORDER: [Pivot; 3] = [Pivot::Layer, Pivot::Area, Pivot::Filter];

    /// Lowercase name of the pivot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pivot::Layer => "layer",
            Pivot::Area => "area",
            Pivot::Filter => "filter",
        }
    }

    /// Label used by placeholder tree nodes when a level has no candidates.
    pub fn empty_label(&self) -> &'static str {
        match self {
            Pivot::Layer => "No layers",
            Pivot::Area => "No areas",
            Pivot::Filter => "No filters",
        }
    }
}

impl fmt::Display for Pivot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pivot {
    type Err = QueryError;

    fn from_str(s: &str) -> QueryResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "layer" | "layerid" => Ok(Pivot::Layer),
            "area" | "areaid" => Ok(Pivot::Area),
            "filter" | "filterid" => Ok(Pivot::Filter),
            _ => Err(QueryError::InvalidPivot(s.to_string())),
        }
    }
}

/// The order in which pivots become tree levels.
///
/// # Example
///
/// ```rust
/// use layer_query::{Pivot, PivotOrder};
///
/// let order: PivotOrder = "area, layer, filter".parse().unwrap();
/// assert_eq!(order.get(0), Some(Pivot::Area));
/// assert_eq!(order.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PivotOrder(Vec<Pivot>);

impl PivotOrder {
    /// Creates an order, rejecting empty or repeated pivots.
    pub fn new(pivots: Vec<Pivot>) -> QueryResult<Self> {
        if pivots.is_empty() {
            return Err(QueryError::EmptyPivotOrder);
        }
        for (i, pivot) in pivots.iter().enumerate() {
            if pivots[..i].contains(pivot) {
                return Err(QueryError::DuplicatePivot(*pivot));
            }
        }
        Ok(Self(pivots))
    }

    /// Returns the pivot at a tree depth.
    pub fn get(&self, index: usize) -> Option<Pivot> {
        self.0.get(index).copied()
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an order has at least one pivot.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the pivots as a slice.
    pub fn as_slice(&self) -> &[Pivot] {
        &self.0
    }

    /// Iterates pivots in order.
    pub fn iter(&self) -> impl Iterator<Item = Pivot> + '_ {
        self.0.iter().copied()
    }
}

impl Default for PivotOrder {
    fn default() -> Self {
        Self(Pivot::RESOLUTION_ORDER.to_vec())
    }
}

impl FromStr for PivotOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> QueryResult<Self> {
        let pivots = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Pivot::from_str)
            .collect::<QueryResult<Vec<_>>>()?;
        PivotOrder::new(pivots)
    }
}

impl fmt::Display for PivotOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Pivot::as_str).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_from_str() {
        assert_eq!("layer".parse::<Pivot>().unwrap(), Pivot::Layer);
        assert_eq!("areaId".parse::<Pivot>().unwrap(), Pivot::Area);
        assert_eq!(" Filter ".parse::<Pivot>().unwrap(), Pivot::Filter);
        assert_eq!(
            "style".parse::<Pivot>(),
            Err(QueryError::InvalidPivot("style".to_string()))
        );
    }

    #[test]
    fn test_default_order() {
        let order = PivotOrder::default();
        assert_eq!(order.as_slice(), &[Pivot::Layer, Pivot::Area, Pivot::Filter]);
        assert_eq!(order.to_string(), "layer,area,filter");
    }

    #[test]
    fn test_order_rejects_duplicates() {
        let err = PivotOrder::new(vec![Pivot::Layer, Pivot::Area, Pivot::Layer]).unwrap_err();
        assert_eq!(err, QueryError::DuplicatePivot(Pivot::Layer));
    }

    #[test]
    fn test_order_rejects_empty() {
        assert_eq!("".parse::<PivotOrder>(), Err(QueryError::EmptyPivotOrder));
    }

    #[test]
    fn test_partial_order() {
        let order: PivotOrder = "filter,layer".parse().unwrap();
        assert_eq!(order.len(), 2);
        assert_eq!(order.get(1), Some(Pivot::Layer));
        assert_eq!(order.get(2), None);
    }
}
