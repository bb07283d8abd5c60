use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ChampMap;

/// 1000 entries: insert all, verify all, remove all.
#[test]
fn thousand_entries() {
    let mut map = ChampMap::new();
    for i in 0_u64..1000 {
        map.insert(i, i * 3);
    }
    assert_eq!(map.len(), 1000);

    for i in 0_u64..1000 {
        assert_eq!(map.get(&i), Some(&(i * 3)), "missing key {i}");
    }

    for i in 0_u64..1000 {
        assert!(map.remove(&i).is_some(), "failed to remove key {i}");
    }
    assert!(map.is_empty());
    assert!(map.root.is_none());
}

/// Deep trie: keys with shared hash prefixes force deeper nodes.
#[test]
fn deep_shared_prefixes() {
    let mut map = ChampMap::new();
    // Sequential integers often share hash prefix bits,
    // forcing deeper trie nodes.
    for i in 0_u64..500 {
        map.insert(i, i);
    }
    assert_eq!(map.len(), 500);
    for i in 0_u64..500 {
        assert_eq!(map.get(&i), Some(&i));
    }
}

/// Insert + overwrite + remove interleaved.
#[test]
fn interleaved_operations() {
    let mut map = ChampMap::new();
    for i in 0_u64..200 {
        map.insert(i, i);
    }
    // Overwrite even keys.
    for i in (0_u64..200).step_by(2) {
        map.insert(i, i + 1000);
    }
    // Remove odd keys.
    for i in (1_u64..200).step_by(2) {
        assert!(map.remove(&i).is_some());
    }
    assert_eq!(map.len(), 100);
    for i in (0_u64..200).step_by(2) {
        assert_eq!(map.get(&i), Some(&(i + 1000)));
    }
}

/// Random churn with frequent snapshots, verified against a replay.
#[test]
fn random_churn_with_snapshots() {
    let mut rng = StdRng::seed_from_u64(0x57E5);
    let mut map = ChampMap::new();
    let mut history: Vec<(u32, Option<u32>)> = Vec::new();
    let mut snapshots = Vec::new();

    for step in 0..5000_u32 {
        let key = rng.gen_range(0..1024);
        if rng.gen_bool(0.6) {
            map.insert(key, step);
            history.push((key, Some(step)));
        } else {
            map.remove(&key);
            history.push((key, None));
        }
        if step % 500 == 0 {
            snapshots.push((map.clone(), history.len()));
        }
    }

    for (snapshot, upto) in snapshots {
        let mut replay = std::collections::HashMap::new();
        for &(key, value) in &history[..upto] {
            match value {
                Some(v) => {
                    replay.insert(key, v);
                }
                None => {
                    replay.remove(&key);
                }
            }
        }
        assert_eq!(snapshot.len(), replay.len());
        for (k, v) in &replay {
            assert_eq!(snapshot.get(k), Some(v));
        }
    }
}
