//! Weighted random selection.
//!
//! Picks one provider with probability proportional to its weight by walking
//! the cumulative distribution in list order. The random source is passed in
//! so callers control seeding; the provider list is never mutated.

use rand::Rng;

use crate::upstream::provider::ProviderDescriptor;

/// Index of a provider chosen proportionally to weight.
///
/// Returns `None` only for an empty slice.
pub fn select_index<R: Rng + ?Sized>(providers: &[ProviderDescriptor], rng: &mut R) -> Option<usize> {
    let last = providers.len().checked_sub(1)?;
    let total: u64 = providers.iter().map(|p| u64::from(p.weight.get())).sum();

    let mut r = rng.gen_range(0..total);
    for (index, provider) in providers.iter().enumerate() {
        let weight = u64::from(provider.weight.get());
        if r < weight {
            return Some(index);
        }
        r -= weight;
    }

    // Unreachable with integer weights; keeps the walk total.
    Some(last)
}

/// Provider chosen proportionally to weight.
pub fn select_one<'a, R: Rng + ?Sized>(
    providers: &'a [ProviderDescriptor],
    rng: &mut R,
) -> Option<&'a ProviderDescriptor> {
    select_index(providers, rng).map(|index| &providers[index])
}
