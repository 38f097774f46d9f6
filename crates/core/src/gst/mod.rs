//! GST (India goods and services tax) calculation.
//!
//! Intrastate supplies split the rate evenly into CGST and SGST; interstate
//! supplies carry the whole rate as IGST. Each component is rounded on its
//! own, so CGST + SGST can differ by a paisa from a single rounding of the
//! full rate. Existing tenant data depends on that, so it stays.

mod service;

#[cfg(test)]
mod service_props;

pub use service::{GstBreakdown, GstComponent, GstError, GstService};
