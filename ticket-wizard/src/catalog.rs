//! The fixed ticket catalog.
//!
//! Order is display order. The two paid offerings share a name and differ only
//! in id and price.

use crate::types::TicketOffering;

/// All offerings, in display order
pub const CATALOG: &[TicketOffering] = &[
    TicketOffering::new("free-1", "Basic Free Ticket", 0, "Access to main event hall"),
    TicketOffering::new("paid-1", "VIP Ticket", 50, "Premium seating, exclusive access"),
    TicketOffering::new("paid-2", "VIP Ticket", 150, "Premium seating, exclusive access"),
];

/// Looks up an offering by id
#[must_use]
pub fn find_offering(id: &str) -> Option<&'static TicketOffering> {
    CATALOG.iter().find(|offering| offering.id == id)
}
