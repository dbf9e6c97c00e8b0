#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use rand::{rngs::StdRng, SeedableRng};

    use std::collections::BTreeSet;

    use crate::evaluation::WIN_SCORE;
    use crate::self_play::{play_game, Outcome};
    use crate::*;

    fn believe(state: GameState) -> BeliefState {
        let mut belief = BeliefState::with_visibility(
            Visibility::from_state(&state),
            state.num_pieces(),
        );
        belief.add(state, 1.0);
        belief
    }

    fn check_invariants(belief: &BeliefState) {
        let members: Vec<&GameState> = belief.states().map(|(state, _)| state).collect();
        let first = members[0];
        for state in members.iter() {
            assert_eq!(state.turn(), first.turn());
            assert_eq!(state.num_pieces(), belief.played());
            // the mask can be recomputed from any member
            assert_eq!(&Visibility::from_state(state), belief.visibility());
            for row in 0..HEIGHT {
                for column in 0..WIDTH {
                    if belief.visibility().is_visible(row, column) {
                        assert_eq!(state.content(row, column), first.content(row, column));
                    }
                }
            }
        }
    }

    #[test]
    pub fn empty_board_plays_center() -> Result<()> {
        let mut engine = SearchEngine::new();
        let belief = believe(GameState::new());

        assert_eq!(engine.find_next_move(&belief), Some(3));
        assert!(engine.node_count > 0);
        Ok(())
    }

    #[test]
    pub fn immediate_win_is_taken() -> Result<()> {
        let belief = believe(GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                "......O",
                "XXX..OO",
            ],
            Player::Engine,
        )?);
        let mut engine = SearchEngine::new();

        assert_eq!(engine.find_immediate_win(&belief), Some(3));
        assert_eq!(engine.find_next_move(&belief), Some(3));
        // answered before any search
        assert_eq!(engine.node_count, 0);
        Ok(())
    }

    #[test]
    pub fn immediate_threat_is_blocked() -> Result<()> {
        let belief = believe(GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                ".XX....",
                ".OOO..X",
            ],
            Player::Engine,
        )?);
        let mut engine = SearchEngine::new();

        assert_eq!(engine.find_immediate_win(&belief), None);
        assert_eq!(engine.find_immediate_threat(&belief), Some(4));
        assert_eq!(engine.find_next_move(&belief), Some(4));
        assert_eq!(engine.node_count, 0);
        Ok(())
    }

    #[test]
    pub fn threat_share_must_exceed_threshold() -> Result<()> {
        // the opponent threatens columns 0 and 4 in one of two members
        let threatened = GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                ".....X.",
                ".OOO.XX",
            ],
            Player::Engine,
        )?;
        let quiet = GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                ".....X.",
                "O.O.OXX",
            ],
            Player::Engine,
        )?;
        let mut belief = BeliefState::new();
        belief.add(threatened, 0.5);
        belief.add(quiet, 0.5);

        let engine = SearchEngine::new();
        assert_eq!(engine.find_immediate_threat(&belief), Some(4));

        let cautious = SearchEngine::new().with_threat_threshold(0.6);
        assert_eq!(cautious.find_immediate_threat(&belief), None);
        Ok(())
    }

    #[test]
    pub fn full_board_has_no_move() -> Result<()> {
        let state = GameState::from_rows(
            &[
                "OOXXOOX",
                "XXOOXXO",
                "OOXXOOX",
                "XXOOXXO",
                "OOXXOOX",
                "XXOOXXO",
            ],
            Player::Engine,
        )?;
        assert_eq!(state.winner(), None);
        assert!(state.is_game_over());

        let belief = believe(state);
        assert!(belief.is_full());
        assert!(belief.get_moves().is_empty());
        assert_eq!(SearchEngine::new().find_next_move(&belief), None);
        Ok(())
    }

    #[test]
    pub fn shared_column_percepts_merge() -> Result<()> {
        let state = GameState::from_rows(
            &[
                ".......",
                "X......",
                "O......",
                "X......",
                "O......",
                "X.....O",
            ],
            Player::Engine,
        )?;

        let mut low = Visibility::new();
        let mut high = Visibility::new();
        for mask in [&mut low, &mut high] {
            mask.set_visible(0, 6, true);
            mask.set_visible(0, 0, true);
            mask.set_visible(1, 0, true);
        }
        high.set_visible(2, 0, true);
        high.set_visible(3, 0, true);
        assert_ne!(low.percept_key(), high.percept_key());

        let mut first = BeliefState::with_visibility(low, 6);
        first.add(state, 1.0);
        let mut second = BeliefState::with_visibility(high, 6);
        second.add(state, 1.0);

        // filling column 0 reveals all of it in both
        let mut results = first.put_piece_player(0).expect("engine to move");
        results.merge(second.put_piece_player(0).expect("engine to move"));

        assert_eq!(results.len(), 1);
        let merged = results.iter().next().expect("one bucket");
        assert_eq!(merged.size(), 1);
        assert_eq!(merged.proba_sum(), 2.0);
        assert_eq!(merged.played(), 7);
        for row in 0..HEIGHT {
            assert!(merged.visibility().is_visible(row, 0));
        }
        Ok(())
    }

    #[test]
    pub fn repeated_search_hits_cache() -> Result<()> {
        let belief = believe(GameState::from_moves("33")?);
        let mut engine = SearchEngine::new();

        let first = engine.and_or_search(
            &belief,
            3,
            f64::NEG_INFINITY,
            f64::INFINITY,
            &mut BTreeSet::new(),
        );
        let (nodes, hits) = (engine.node_count, engine.cache_hits);

        let second = engine.and_or_search(
            &belief,
            3,
            f64::NEG_INFINITY,
            f64::INFINITY,
            &mut BTreeSet::new(),
        );
        assert_eq!(first, second);
        assert_eq!(engine.cache_hits, hits + 1);
        assert_eq!(engine.node_count, nodes + 1);
        Ok(())
    }

    #[test]
    pub fn search_is_deterministic() -> Result<()> {
        let belief = believe(GameState::from_moves("3324")?);
        let mut first = SearchEngine::new().with_depth(3);
        let mut second = SearchEngine::new().with_depth(3);
        assert_eq!(first.find_next_move(&belief), second.find_next_move(&belief));
        assert_eq!(first.node_count, second.node_count);
        Ok(())
    }

    #[test]
    pub fn path_guard_rejects_revisits() -> Result<()> {
        let belief = believe(GameState::from_moves("33")?);
        let mut engine = SearchEngine::new();

        let mut path = BTreeSet::new();
        path.insert(belief.canonicalize());
        let score = engine.and_or_search(&belief, 2, f64::NEG_INFINITY, f64::INFINITY, &mut path);
        assert_eq!(score, f64::NEG_INFINITY);
        assert!(engine.cache().is_empty());

        // a finished search leaves the path as it found it
        let mut path = BTreeSet::new();
        engine.and_or_search(&belief, 2, f64::NEG_INFINITY, f64::INFINITY, &mut path);
        assert!(path.is_empty());
        Ok(())
    }

    #[test]
    pub fn opponent_win_scores_as_loss() -> Result<()> {
        let belief = believe(GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                ".XXX...",
                ".OOOX..",
            ],
            Player::Opponent,
        )?);
        let mut engine = SearchEngine::new();
        let score = engine.and_or_search(
            &belief,
            2,
            f64::NEG_INFINITY,
            f64::INFINITY,
            &mut BTreeSet::new(),
        );
        assert_eq!(score, -WIN_SCORE);
        Ok(())
    }

    #[test]
    pub fn belief_invariants_hold() -> Result<()> {
        let model = ProbabilisticOpponent;
        let mut level = vec![believe(GameState::new())];

        for _ply in 0..4 {
            let mut next_level = Vec::new();
            for belief in level.iter() {
                match belief.turn() {
                    Some(Player::Engine) => {
                        // predict is refused on the engine's turn
                        assert!(belief.predict(&model).is_none());
                        for column in belief.get_moves() {
                            let results = belief.put_piece_player(column).expect("engine to move");
                            next_level.extend(results);
                        }
                    }
                    Some(Player::Opponent) => {
                        assert!(belief.put_piece_player(0).is_none());
                        let results = belief.predict(&model).expect("opponent to move");
                        let total: f64 = results.iter().map(BeliefState::proba_sum).sum();
                        assert!((total - belief.proba_sum()).abs() < 1e-9);
                        next_level.extend(results);
                    }
                    None => unreachable!("beliefs are never empty here"),
                }
            }
            for belief in next_level.iter() {
                check_invariants(belief);
                assert_eq!(belief.visibility().percept_key().to_visibility(), *belief.visibility());
            }
            level = next_level;
        }
        assert_eq!(level[0].played(), 4);
        Ok(())
    }

    #[test]
    pub fn self_play_games_finish() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut engine = SearchEngine::new().with_depth(2);

        for &first in [Player::Engine, Player::Opponent].iter() {
            let record = play_game(&mut engine, &mut rng, first)?;
            assert!(record.final_state.is_game_over());
            assert_eq!(record.moves.len(), record.final_state.num_pieces());
            assert_eq!(record.max_belief_size, 1);
            let expected = match record.final_state.winner() {
                Some(Player::Engine) => Outcome::EngineWin,
                Some(Player::Opponent) => Outcome::OpponentWin,
                None => Outcome::Draw,
            };
            assert_eq!(record.outcome, expected);
        }
        // the cache outlives single games
        assert!(!engine.cache().is_empty());
        Ok(())
    }
}
