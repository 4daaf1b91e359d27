//! The fracture plan of a stick: which frame each break happens on and where
//! along the stick it lands.

use serde::{Deserialize, Serialize};

/// One fracture event in the recursive break-up of a stick.
///
/// `fr_time` is the frame index on which the parent stops existing and its
/// two fragments appear; `fr_loc` is the break position measured from the
/// parent's lower end, so the left fragment has length `fr_loc` and the
/// right fragment the remainder. Children describe whether each fragment
/// fractures again; a valid node carries either two children or none.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractureSample {
    pub fr_time: usize,
    pub fr_loc: f64,
    pub childl: Option<Box<FractureSample>>,
    pub childr: Option<Box<FractureSample>>,
}

impl FractureSample {
    /// Number of fracture events in the subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.childl.as_ref().map_or(0, |c| c.node_count())
            + self.childr.as_ref().map_or(0, |c| c.node_count())
    }

    /// Number of leaf fragments the subtree produces.
    pub fn fragment_count(&self) -> usize {
        self.node_count() + 1
    }

    /// Depth of the subtree (1 for a childless fracture).
    pub fn depth(&self) -> usize {
        let dl = self.childl.as_ref().map_or(0, |c| c.depth());
        let dr = self.childr.as_ref().map_or(0, |c| c.depth());
        1 + dl.max(dr)
    }

    /// First node holding exactly one child, if any. Such a tree cannot have
    /// been produced by the generative model and is rejected on load.
    pub fn first_lopsided(&self) -> Option<usize> {
        if self.childl.is_some() != self.childr.is_some() {
            return Some(self.fr_time);
        }
        self.childl
            .as_ref()
            .and_then(|c| c.first_lopsided())
            .or_else(|| self.childr.as_ref().and_then(|c| c.first_lopsided()))
    }
}
