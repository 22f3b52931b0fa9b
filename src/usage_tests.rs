/**
 * SubRec
 * Copyright (C) 2019 The SubRec contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

#[cfg(test)]
mod tests {

    use fnv::FnvHashMap;
    use tempfile::tempdir;

    use crate::io::Interaction;
    use crate::recommend::Recommender;
    use crate::{train, TrainConfig};

    fn record(context: &str, item: &str, count: u64) -> Interaction {
        Interaction {
            context: context.to_string(),
            item: item.to_string(),
            count,
        }
    }

    /* A toy interaction log: "rust" and "programming" are posted in by the
       same three people with the same counts, "knitting" and the remaining
       communities each live with a single separate person. */
    fn toy_log() -> Vec<Interaction> {
        vec![
            record("alice", "Rust", 10),
            record("alice", "Programming", 10),
            record("bob", "rust", 8),
            record("bob", "programming", 8),
            record("carol", "rust", 9),
            record("carol", "programming", 9),
            record("dana", "knitting", 5),
            record("erin", "gardening", 4),
            record("frank", "cooking", 4),
            record("grace", "chess", 4),
        ]
    }

    #[test]
    fn programmatic_usage() {
        /* Train a small model. The configuration mirrors the defaults except
           for a rank suited to six communities. */
        let config = TrainConfig {
            rank: 8,
            pool_size: 2,
            ..TrainConfig::default()
        };

        let artifacts = train(&toy_log(), &config).unwrap();

        assert_eq!(artifacts.factors.shape(), &[6, 8]);
        assert_eq!(artifacts.dictionary.len(), 6);
        assert!(artifacts.dictionary.contains(&"rust".to_string()));

        /* Persist the artifact set and load it back the way a serving
           process would at startup. */
        let model_dir = tempdir().unwrap();
        artifacts.save(model_dir.path()).unwrap();

        let recommender = Recommender::from_dir(model_dir.path()).unwrap();

        /* The factorization recovers the correlated pair: each of the two
           communities has the other as its nearest neighbor. */
        let rust = recommender.item_index("rust").unwrap();
        let programming = recommender.item_index("programming").unwrap();

        assert_eq!(recommender.top_related(rust, 1)[0].0, programming);
        assert_eq!(recommender.top_related(programming, 1)[0].0, rust);

        /* A person who only posted in "Rust" gets "programming" as the top
           recommendation, and never "rust" itself back. */
        let mut post_counts = FnvHashMap::default();
        post_counts.insert("Rust".to_string(), 12u64);

        let recommendations = recommender.get_similar(&post_counts, 5).unwrap();

        assert!(!recommendations.is_empty());
        assert_eq!(recommendations[0], "programming");
        assert!(!recommendations.contains(&"rust".to_string()));

        /* Identical requests against the same model yield identical
           rankings. */
        let again = recommender.get_similar(&post_counts, 5).unwrap();
        assert_eq!(recommendations, again);
    }
}
