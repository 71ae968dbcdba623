use crate::models::Offer;

// Offers are append-only within one search. The poll contract guarantees each
// response carries only offers past the acknowledged sequence number, so
// plain concatenation in arrival order is the whole merge strategy.
#[derive(Clone, Debug, Default)]
pub struct OfferAccumulator {
    offers: Vec<Offer>,
}

impl OfferAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, batch: Vec<Offer>) {
        self.offers.extend(batch);
    }

    pub fn clear(&mut self) {
        self.offers.clear();
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn to_vec(&self) -> Vec<Offer> {
        self.offers.clone()
    }
}
