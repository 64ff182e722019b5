//! Match records and the capped top-K buffer.
//!
//! A bounded buffer keeps the K closest matches seen so far as a
//! **min-heap on `cosdist`**: larger cosdist means smaller angle, so the
//! root is the farthest kept match. A new candidate is compared against
//! the root in O(1) and, if strictly closer, replaces it in O(log K).

/// One accepted match: primary index, secondary index, and the cosine of
/// the angular separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub cat_ind: i64,
    pub input_ind: i64,
    pub cosdist: f64,
}

/// Reorder a filled buffer so the smallest cosdist sits at index 0.
pub fn build_heap(buf: &mut [Match]) {
    if buf.len() <= 1 {
        return;
    }
    for at in (0..buf.len() / 2).rev() {
        sift_down(buf, at);
    }
}

/// Admit `cand` only if strictly closer than the farthest kept match,
/// evicting that match. Ties keep the incumbent.
pub fn heap_insert(buf: &mut [Match], cand: Match) {
    if cand.cosdist > buf[0].cosdist {
        buf[0] = cand;
        sift_down(buf, 0);
    }
}

fn sift_down(buf: &mut [Match], mut at: usize) {
    let n = buf.len();
    loop {
        let mut child = 2 * at + 1;
        if child >= n {
            break;
        }
        // descend toward the smaller cosdist
        if child + 1 < n && buf[child + 1].cosdist < buf[child].cosdist {
            child += 1;
        }
        if buf[at].cosdist <= buf[child].cosdist {
            break;
        }
        buf.swap(at, child);
        at = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(cosdist: f64) -> Match {
        Match {
            cat_ind: 0,
            input_ind: 0,
            cosdist,
        }
    }

    fn assert_min_heap(buf: &[Match]) {
        for at in 0..buf.len() {
            for child in [2 * at + 1, 2 * at + 2] {
                if child < buf.len() {
                    assert!(
                        buf[at].cosdist <= buf[child].cosdist,
                        "heap violated at {at}: {} > {}",
                        buf[at].cosdist,
                        buf[child].cosdist
                    );
                }
            }
        }
    }

    #[test]
    fn build_heap_puts_smallest_at_root() {
        let mut buf = vec![m(0.9), m(0.3), m(0.7), m(0.5), m(0.8)];
        build_heap(&mut buf);
        assert_eq!(buf[0].cosdist, 0.3);
        assert_min_heap(&buf);
    }

    #[test]
    fn build_heap_trivial_sizes() {
        let mut empty: Vec<Match> = vec![];
        build_heap(&mut empty);

        let mut one = vec![m(0.5)];
        build_heap(&mut one);
        assert_eq!(one[0].cosdist, 0.5);
    }

    #[test]
    fn insert_closer_evicts_farthest() {
        let mut buf = vec![m(0.2), m(0.6), m(0.4)];
        build_heap(&mut buf);

        heap_insert(&mut buf, m(0.5));
        assert_min_heap(&buf);
        let mut kept: Vec<f64> = buf.iter().map(|x| x.cosdist).collect();
        kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(kept, vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn insert_farther_is_rejected() {
        let mut buf = vec![m(0.2), m(0.6), m(0.4)];
        build_heap(&mut buf);

        heap_insert(&mut buf, m(0.1));
        let mut kept: Vec<f64> = buf.iter().map(|x| x.cosdist).collect();
        kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(kept, vec![0.2, 0.4, 0.6]);
    }

    #[test]
    fn tie_keeps_incumbent() {
        let mut buf = vec![m(0.2), m(0.6), m(0.4)];
        build_heap(&mut buf);

        let mut cand = m(0.2);
        cand.input_ind = 99;
        heap_insert(&mut buf, cand);
        assert!(buf.iter().all(|x| x.input_ind != 99));
    }

    #[test]
    fn single_slot_keeps_larger() {
        let mut buf = vec![m(0.3)];
        heap_insert(&mut buf, m(0.8));
        assert_eq!(buf[0].cosdist, 0.8);
        heap_insert(&mut buf, m(0.5));
        assert_eq!(buf[0].cosdist, 0.8);
    }

    #[test]
    fn stream_keeps_top_k() {
        // feed a pseudo-random stream through a K-slot heap and compare
        // against the sorted tail
        let mut state: u64 = 424242;
        let mut rng = || -> f64 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state as f64) / (u64::MAX as f64)
        };

        const K: usize = 8;
        let stream: Vec<f64> = (0..500).map(|_| rng() * 2.0 - 1.0).collect();

        let mut buf: Vec<Match> = Vec::with_capacity(K);
        for &cosdist in &stream {
            if buf.len() < K {
                buf.push(m(cosdist));
                if buf.len() == K {
                    build_heap(&mut buf);
                }
            } else {
                heap_insert(&mut buf, m(cosdist));
            }
        }
        assert_min_heap(&buf);

        let mut expected = stream.clone();
        expected.sort_by(|a, b| b.partial_cmp(a).unwrap());
        expected.truncate(K);
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut kept: Vec<f64> = buf.iter().map(|x| x.cosdist).collect();
        kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(kept, expected);
    }
}
