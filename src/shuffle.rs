use rand::seq::SliceRandom;
use rand::Rng;

/// Share of the sequence length used as the number of random pairwise swaps
/// applied after the round-robin pass.
const SWAP_RATIO: f64 = 0.15;

/// Shuffle `items` so that categories are spread out instead of clustered.
///
/// Items are grouped by category in order of first appearance, each group is
/// shuffled, groups are consumed round-robin one item at a time, and finally
/// `max(1, floor(0.15 * n))` random swaps loosen the strict rotation.
pub fn interleave_by_category<T, K, F, R>(items: Vec<T>, category: F, rng: &mut R) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
    R: Rng,
{
    let total = items.len();

    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let key = category(&item);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.push(item),
            None => groups.push((key, vec![item])),
        }
    }

    // Reversed so that `pop` yields the shuffled order front to back.
    let mut queues: Vec<Vec<T>> = groups
        .into_iter()
        .map(|(_, mut group)| {
            group.shuffle(rng);
            group.reverse();
            group
        })
        .collect();

    let mut out = Vec::with_capacity(total);
    while !queues.is_empty() {
        queues.retain_mut(|queue| match queue.pop() {
            Some(item) => {
                out.push(item);
                !queue.is_empty()
            }
            None => false,
        });
    }

    if out.len() >= 2 {
        let swaps = ((out.len() as f64 * SWAP_RATIO).floor() as usize).max(1);
        for _ in 0..swaps {
            let a = rng.gen_range(0..out.len());
            let b = rng.gen_range(0..out.len());
            out.swap(a, b);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn keeps_the_same_multiset() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let items: Vec<(char, u32)> = (0..30).map(|i| (['a', 'b', 'c'][i % 3], i as u32)).collect();
        let mut shuffled = interleave_by_category(items.clone(), |(c, _)| *c, &mut rng);
        shuffled.sort_by_key(|(_, n)| *n);
        assert_eq!(shuffled, items);
    }

    #[test]
    fn spreads_clustered_categories() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut items = vec![('a', 0); 20];
        items.extend(vec![('b', 0); 20]);

        let shuffled = interleave_by_category(items, |(c, _)| *c, &mut rng);

        // A perfect rotation has 39 category changes and 6 swaps can break at most 24.
        let changes = shuffled.windows(2).filter(|w| w[0].0 != w[1].0).count();
        assert!(changes >= 15, "only {changes} category changes");
    }

    #[test]
    fn handles_tiny_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(interleave_by_category(Vec::<u8>::new(), |x| *x, &mut rng).is_empty());
        assert_eq!(interleave_by_category(vec![5u8], |x| *x, &mut rng), vec![5]);
    }
}
