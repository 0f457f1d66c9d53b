use log::{debug, info};
use rand::Rng;

use crate::board::{border_walls, Wall, WallMap};
use crate::catalog::PuzzleCatalog;
use crate::constants::{QUIESCENCE_MS, SPLASH_BOARD, TICK_MS};
use crate::engine::{step_robots, RobotStep};
use crate::error::CatalogError;
use crate::input::{self, map_key, ControlAction, Controls, InputAction};
use crate::puzzle::Puzzle;
use crate::robot::Robot;
use crate::types::{
    Board, Cell, ControlsView, Direction, PuzzleInit, RuntimeEvent, SessionPhase, Snapshot,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub tick_ms: u64,
    pub quiescence_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            quiescence_ms: QUIESCENCE_MS,
        }
    }
}

/// How a key or control message changed the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Accepted,
    ControlsChanged,
    PuzzleLoaded,
    MuteRequested,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub completed_moves: u32,
    pub victory: bool,
}

#[derive(Clone, Debug)]
struct LoadedPuzzle {
    id: u32,
    puzzle: Puzzle,
    // border walls first, then the puzzle's interior walls
    walls: Vec<Wall>,
    wall_map: WallMap,
}

pub struct Session {
    options: SessionOptions,
    phase: SessionPhase,
    loaded: Option<LoadedPuzzle>,
    robots: Vec<Robot>,
    // cells travelled by each robot in its current slide, parallel to `robots`
    slide_cells: Vec<u32>,
    controls: Controls,
    moves: u32,
    tick_counter: u64,
    last_input_ms: Option<u64>,
    events: Vec<RuntimeEvent>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            phase: SessionPhase::Idle,
            loaded: None,
            robots: Vec::new(),
            slide_cells: Vec::new(),
            controls: Controls::default(),
            moves: 0,
            tick_counter: 0,
            last_input_ms: None,
            events: Vec::new(),
        }
    }

    /// Replaces the running puzzle with `id`. On error nothing about the session changes.
    pub fn load_puzzle(
        &mut self,
        id: u32,
        catalog: &PuzzleCatalog,
        now_ms: u64,
    ) -> Result<(), CatalogError> {
        let puzzle = catalog.get_puzzle(id)?;

        let mut walls = border_walls(puzzle.board);
        walls.extend_from_slice(&puzzle.walls);
        let wall_map = WallMap::from_walls(&walls);

        self.robots = puzzle.robots.iter().map(Robot::from_start).collect();
        self.slide_cells = vec![0; self.robots.len()];
        self.controls = Controls::default();
        self.moves = 0;
        self.tick_counter = 0;
        self.last_input_ms = Some(now_ms);
        self.phase = SessionPhase::Active;
        self.events.clear();
        self.events.push(RuntimeEvent::PuzzleInitialized {
            puzzle_id: id,
            minimum_moves: puzzle.minimum_moves,
        });
        info!(
            "[session] loaded puzzle {id}: {}x{} board, {} walls, par {}",
            puzzle.board.width,
            puzzle.board.height,
            walls.len(),
            puzzle.minimum_moves
        );
        self.loaded = Some(LoadedPuzzle {
            id,
            puzzle,
            walls,
            wall_map,
        });
        Ok(())
    }

    pub fn load_random_puzzle<R: Rng + ?Sized>(
        &mut self,
        catalog: &PuzzleCatalog,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<u32, CatalogError> {
        let id = catalog.random_puzzle_id(rng)?;
        self.load_puzzle(id, catalog, now_ms)?;
        Ok(id)
    }

    /// Reloads the current puzzle from its starting layout. Returns false when none is loaded.
    pub fn restart(&mut self, catalog: &PuzzleCatalog, now_ms: u64) -> Result<bool, CatalogError> {
        let Some(id) = self.puzzle_id() else {
            return Ok(false);
        };
        self.load_puzzle(id, catalog, now_ms)?;
        Ok(true)
    }

    pub fn handle_key<R: Rng + ?Sized>(
        &mut self,
        code: u32,
        catalog: &PuzzleCatalog,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<KeyOutcome, CatalogError> {
        self.handle_action(map_key(code), catalog, rng, now_ms)
    }

    pub fn handle_action<R: Rng + ?Sized>(
        &mut self,
        action: InputAction,
        catalog: &PuzzleCatalog,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<KeyOutcome, CatalogError> {
        let control = match action {
            InputAction::Noop => return Ok(KeyOutcome::Ignored),
            InputAction::Move(dir) => {
                return Ok(if self.apply_direction(dir, now_ms) {
                    KeyOutcome::Accepted
                } else {
                    KeyOutcome::Ignored
                });
            }
            InputAction::Control(control) => control,
        };

        match control {
            ControlAction::SelectRobot(color) => {
                self.controls.select(color);
                self.push_controls_changed();
                Ok(KeyOutcome::ControlsChanged)
            }
            ControlAction::TogglePair => {
                self.controls.toggle_pair();
                self.push_controls_changed();
                Ok(KeyOutcome::ControlsChanged)
            }
            // continue only means something before the first puzzle or on the victory screen
            ControlAction::Start => match self.phase {
                SessionPhase::Active => Ok(KeyOutcome::Ignored),
                SessionPhase::Idle | SessionPhase::Won => {
                    self.load_random_puzzle(catalog, rng, now_ms)?;
                    Ok(KeyOutcome::PuzzleLoaded)
                }
            },
            ControlAction::NewPuzzle => {
                self.load_random_puzzle(catalog, rng, now_ms)?;
                Ok(KeyOutcome::PuzzleLoaded)
            }
            ControlAction::Restart => {
                if self.restart(catalog, now_ms)? {
                    Ok(KeyOutcome::PuzzleLoaded)
                } else {
                    Ok(KeyOutcome::Ignored)
                }
            }
            ControlAction::Mute => {
                self.events.push(RuntimeEvent::MuteRequested);
                Ok(KeyOutcome::MuteRequested)
            }
        }
    }

    /// Starts a slide of the addressed robot. Only an active puzzle accepts directions.
    pub fn apply_direction(&mut self, dir: Direction, now_ms: u64) -> bool {
        if self.phase != SessionPhase::Active {
            debug!("[session] {dir:?} ignored in phase {:?}", self.phase);
            return false;
        }
        match input::apply_direction(dir, &mut self.robots, &self.controls) {
            Some(idx) => {
                self.slide_cells[idx] = 0;
                self.last_input_ms = Some(now_ms);
                true
            }
            None => {
                debug!(
                    "[session] direction {dir:?} rejected for {}",
                    self.controls.addressed()
                );
                false
            }
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.robots.iter().any(Robot::is_sliding)
    }

    /// True while the tick loop should keep running.
    pub fn should_tick(&self, now_ms: u64) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }
        if self.is_sliding() {
            return true;
        }
        match self.last_input_ms {
            Some(last) => now_ms.saturating_sub(last) < self.options.quiescence_ms,
            None => false,
        }
    }

    /// Runs one engine pass, then counts finished slides and checks the goal.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.phase != SessionPhase::Active {
            return report;
        }
        let Some(loaded) = self.loaded.as_ref() else {
            return report;
        };
        let puzzle_id = loaded.id;
        let goal = loaded.puzzle.goal;
        let goal_color = loaded.puzzle.goal_color;
        let minimum_moves = loaded.puzzle.minimum_moves;

        self.tick_counter += 1;
        let steps = step_robots(&mut self.robots, &loaded.wall_map, loaded.puzzle.board);

        for (idx, step) in steps.into_iter().enumerate() {
            if let RobotStep::Advanced { to, .. } = step {
                self.slide_cells[idx] += 1;
                // the goal robot ends its slide on the goal instead of sliding past it
                if to == goal && self.robots[idx].color() == goal_color {
                    self.robots[idx].stop();
                    self.finish_slide(idx, &mut report);
                }
            } else if step.just_stopped() {
                self.finish_slide(idx, &mut report);
            }
        }

        let solved = self
            .robots
            .iter()
            .filter(|robot| robot.color() == goal_color)
            .any(|robot| robot.position() == goal);
        if solved {
            for (robot, cells) in self.robots.iter_mut().zip(self.slide_cells.iter_mut()) {
                robot.stop();
                *cells = 0;
            }
            self.phase = SessionPhase::Won;
            self.events.push(RuntimeEvent::Victory {
                puzzle_id,
                moves: self.moves,
                minimum_moves,
            });
            info!(
                "[session] puzzle {puzzle_id} solved in {} moves (par {minimum_moves}) at tick {}",
                self.moves, self.tick_counter
            );
            report.victory = true;
        }
        report
    }

    fn finish_slide(&mut self, idx: usize, report: &mut TickReport) {
        let moved = self.slide_cells[idx] > 0;
        self.slide_cells[idx] = 0;
        self.events.push(RuntimeEvent::RobotStopped {
            color: self.robots[idx].color(),
            moved,
        });
        if moved {
            self.moves += 1;
            report.completed_moves += 1;
            self.events
                .push(RuntimeEvent::MoveCompleted { moves: self.moves });
        }
    }

    fn push_controls_changed(&mut self) {
        self.events.push(RuntimeEvent::ControlsChanged {
            controls: self.controls.view(),
        });
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        Snapshot {
            tick: self.tick_counter,
            phase: self.phase,
            puzzle_id: self.puzzle_id(),
            moves: self.moves,
            minimum_moves: self.minimum_moves(),
            robots: self.robots.clone(),
            controls: self.controls.view(),
            events,
        }
    }

    pub fn puzzle_init(&self) -> Option<PuzzleInit> {
        let loaded = self.loaded.as_ref()?;
        Some(PuzzleInit {
            puzzle_id: loaded.id,
            board: loaded.puzzle.board,
            walls: loaded.walls.clone(),
            goal: loaded.puzzle.goal,
            goal_color: loaded.puzzle.goal_color,
            minimum_moves: loaded.puzzle.minimum_moves,
            robots: self.robots.clone(),
        })
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn puzzle_id(&self) -> Option<u32> {
        self.loaded.as_ref().map(|loaded| loaded.id)
    }

    pub fn minimum_moves(&self) -> u32 {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.puzzle.minimum_moves)
            .unwrap_or(0)
    }

    /// Board of the loaded puzzle, or the splash board before the first load.
    pub fn board(&self) -> Board {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.puzzle.board)
            .unwrap_or(SPLASH_BOARD)
    }

    pub fn goal(&self) -> Option<Cell> {
        self.loaded.as_ref().map(|loaded| loaded.puzzle.goal)
    }

    pub fn walls(&self) -> &[Wall] {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.walls.as_slice())
            .unwrap_or(&[])
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn controls(&self) -> ControlsView {
        self.controls.view()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::input::{KEY_M, KEY_RIGHT, KEY_SPACE, KEY_TAB, KEY_TWO};
    use crate::puzzle::tests::blocked_goal_puzzle;
    use crate::robot::RobotStart;
    use crate::types::{ActivePair, RobotColor};

    fn lone_red_puzzle() -> Puzzle {
        let mut puzzle = blocked_goal_puzzle();
        puzzle.robots = vec![RobotStart {
            color: RobotColor::Red,
            x: 2,
            y: 2,
        }];
        puzzle.goal = Cell::new(0, 4);
        puzzle
    }

    fn test_catalog() -> PuzzleCatalog {
        PuzzleCatalog::from_puzzles([(1, lone_red_puzzle()), (2, blocked_goal_puzzle())])
            .expect("test catalog")
    }

    fn select(session: &mut Session, color: RobotColor) {
        let catalog = test_catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = session
            .handle_action(
                InputAction::Control(ControlAction::SelectRobot(color)),
                &catalog,
                &mut rng,
                0,
            )
            .expect("select never fails");
        assert_eq!(outcome, KeyOutcome::ControlsChanged);
    }

    fn run_to_rest(session: &mut Session) -> u64 {
        let mut ticks = 0;
        while session.is_sliding() && ticks < 64 {
            session.tick();
            ticks += 1;
        }
        ticks
    }

    fn position_of(session: &Session, color: RobotColor) -> Cell {
        session
            .robots()
            .iter()
            .find(|robot| robot.color() == color)
            .map(Robot::position)
            .expect("robot present")
    }

    #[test]
    fn loading_builds_border_then_interior_walls_and_resets_controls() {
        let mut puzzle = blocked_goal_puzzle();
        let wall = Wall::single(Cell::new(1, 1), crate::types::Edge::Top);
        puzzle.walls.push(wall);
        let catalog = PuzzleCatalog::from_puzzles([(3, puzzle)]).expect("catalog");
        let mut session = Session::new(SessionOptions::default());
        session.controls.toggle_pair();

        session.load_puzzle(3, &catalog, 10).expect("load");

        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.walls().len(), 21);
        assert_eq!(session.walls()[20], wall);
        assert_eq!(session.controls().pair, ActivePair::YellowBlue);
        assert_eq!(session.controls().addressed, RobotColor::Yellow);
        let snapshot = session.build_snapshot(true);
        assert_eq!(
            snapshot.events,
            vec![RuntimeEvent::PuzzleInitialized {
                puzzle_id: 3,
                minimum_moves: 2
            }]
        );
    }

    #[test]
    fn unknown_puzzle_leaves_session_untouched() {
        let catalog = test_catalog();
        let mut session = Session::new(SessionOptions::default());
        assert!(matches!(
            session.load_puzzle(99, &catalog, 0),
            Err(CatalogError::UnknownPuzzle(99))
        ));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.puzzle_id(), None);
        assert_eq!(session.board(), SPLASH_BOARD);

        session.load_puzzle(2, &catalog, 0).expect("load");
        assert!(session.load_puzzle(42, &catalog, 0).is_err());
        assert_eq!(session.puzzle_id(), Some(2));
        assert_eq!(session.robots().len(), 2);
    }

    #[test]
    fn lone_slide_counts_one_move() {
        let catalog = test_catalog();
        let mut session = Session::new(SessionOptions::default());
        session.load_puzzle(1, &catalog, 0).expect("load");
        select(&mut session, RobotColor::Red);

        assert!(session.apply_direction(Direction::Right, 0));
        run_to_rest(&mut session);

        assert_eq!(position_of(&session, RobotColor::Red), Cell::new(4, 2));
        assert_eq!(session.moves(), 1);
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn occupied_stop_then_zero_distance_block_then_victory() {
        let catalog = test_catalog();
        let mut session = Session::new(SessionOptions::default());
        session.load_puzzle(2, &catalog, 0).expect("load");
        select(&mut session, RobotColor::Red);

        assert!(session.apply_direction(Direction::Right, 0));
        run_to_rest(&mut session);
        assert_eq!(position_of(&session, RobotColor::Red), Cell::new(3, 2));
        assert_eq!(session.moves(), 1);
        assert_eq!(session.phase(), SessionPhase::Active);
        session.build_snapshot(true);

        // blue still parked on the goal: the slide stops before leaving (3,2)
        assert!(session.apply_direction(Direction::Right, 0));
        let report = session.tick();
        assert_eq!(report, TickReport::default());
        assert_eq!(session.moves(), 1);
        assert_eq!(
            session.build_snapshot(true).events,
            vec![RuntimeEvent::RobotStopped {
                color: RobotColor::Red,
                moved: false
            }]
        );

        select(&mut session, RobotColor::Blue);
        assert!(session.apply_direction(Direction::Down, 0));
        run_to_rest(&mut session);
        assert_eq!(position_of(&session, RobotColor::Blue), Cell::new(4, 4));
        assert_eq!(session.moves(), 2);

        select(&mut session, RobotColor::Red);
        assert!(session.apply_direction(Direction::Right, 0));
        session.build_snapshot(true);
        let report = session.tick();

        assert!(report.victory);
        assert_eq!(session.phase(), SessionPhase::Won);
        assert_eq!(session.moves(), 3);
        assert_eq!(
            session.build_snapshot(true).events,
            vec![
                RuntimeEvent::RobotStopped {
                    color: RobotColor::Red,
                    moved: true
                },
                RuntimeEvent::MoveCompleted { moves: 3 },
                RuntimeEvent::Victory {
                    puzzle_id: 2,
                    moves: 3,
                    minimum_moves: 2
                },
            ]
        );
    }

    #[test]
    fn other_colors_slide_over_and_onto_the_goal_without_winning() {
        // blue crosses the goal at (2,2) and parks on the goal at (4,2)
        for goal in [Cell::new(2, 2), Cell::new(4, 2)] {
            let mut puzzle = blocked_goal_puzzle();
            puzzle.robots[0].y = 0;
            puzzle.robots[1].x = 0;
            puzzle.goal = goal;
            let catalog = PuzzleCatalog::from_puzzles([(6, puzzle)]).expect("catalog");
            let mut session = Session::new(SessionOptions::default());
            session.load_puzzle(6, &catalog, 0).expect("load");
            session.build_snapshot(true);

            select(&mut session, RobotColor::Blue);
            assert!(session.apply_direction(Direction::Right, 0));
            run_to_rest(&mut session);

            assert_eq!(position_of(&session, RobotColor::Blue), Cell::new(4, 2));
            assert_eq!(session.phase(), SessionPhase::Active);
            assert_eq!(session.moves(), 1);
            let events = session.build_snapshot(true).events;
            assert!(!events
                .iter()
                .any(|event| matches!(event, RuntimeEvent::Victory { .. })));
        }
    }

    #[test]
    fn victory_freezes_robots_that_are_still_sliding() {
        let mut puzzle = blocked_goal_puzzle();
        puzzle.board.height = 9;
        let catalog = PuzzleCatalog::from_puzzles([(5, puzzle)]).expect("catalog");
        let mut session = Session::new(SessionOptions::default());
        session.load_puzzle(5, &catalog, 0).expect("load");

        select(&mut session, RobotColor::Blue);
        assert!(session.apply_direction(Direction::Down, 0));
        session.tick();
        assert_eq!(position_of(&session, RobotColor::Blue), Cell::new(4, 3));

        select(&mut session, RobotColor::Red);
        assert!(session.apply_direction(Direction::Right, 0));
        session.tick();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(position_of(&session, RobotColor::Red), Cell::new(3, 2));

        let report = session.tick();
        assert!(report.victory);
        assert_eq!(report.completed_moves, 1);
        assert_eq!(position_of(&session, RobotColor::Red), Cell::new(4, 2));
        assert_eq!(position_of(&session, RobotColor::Blue), Cell::new(4, 5));
        assert!(!session.is_sliding());
        assert_eq!(session.moves(), 1);
        assert!(!session.should_tick(0));
    }

    #[test]
    fn sliding_robot_rejects_new_direction() {
        let catalog = test_catalog();
        let mut session = Session::new(SessionOptions::default());
        let mut rng = StdRng::seed_from_u64(3);
        session.load_puzzle(1, &catalog, 0).expect("load");
        select(&mut session, RobotColor::Red);

        assert_eq!(
            session
                .handle_key(KEY_RIGHT, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::Accepted
        );
        session.tick();
        assert!(!session.apply_direction(Direction::Up, 5));
        assert_eq!(session.robots()[0].direction(), Direction::Right);
    }

    #[test]
    fn directions_are_ignored_outside_an_active_puzzle() {
        let mut session = Session::new(SessionOptions::default());
        assert!(!session.apply_direction(Direction::Up, 0));
        assert_eq!(session.tick(), TickReport::default());
        assert_eq!(session.tick_count(), 0);
    }

    #[test]
    fn ticking_continues_through_the_quiescence_window() {
        let catalog = test_catalog();
        let mut session = Session::new(SessionOptions::default());
        assert!(!session.should_tick(0));

        session.load_puzzle(1, &catalog, 1_000).expect("load");
        assert!(session.should_tick(1_500));
        assert!(!session.should_tick(2_000));

        select(&mut session, RobotColor::Red);
        assert!(session.apply_direction(Direction::Right, 5_000));
        assert!(session.should_tick(9_000));
        run_to_rest(&mut session);
        assert!(session.should_tick(5_999));
        assert!(!session.should_tick(6_000));
    }

    #[test]
    fn controls_start_restart_and_mute() {
        let catalog = test_catalog();
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = Session::new(SessionOptions::default());

        assert_eq!(
            session
                .handle_key(82, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::Ignored
        );
        assert_eq!(
            session
                .handle_key(KEY_SPACE, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::PuzzleLoaded
        );
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(
            session
                .handle_key(KEY_SPACE, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::Ignored
        );

        assert_eq!(
            session
                .handle_key(KEY_TAB, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::ControlsChanged
        );
        assert_eq!(session.controls().addressed, RobotColor::Red);
        assert_eq!(
            session
                .handle_key(KEY_TWO, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::ControlsChanged
        );
        assert_eq!(session.controls().addressed, RobotColor::Green);
        assert_eq!(
            session
                .handle_key(KEY_M, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::MuteRequested
        );
        assert!(session
            .build_snapshot(true)
            .events
            .contains(&RuntimeEvent::MuteRequested));
        assert_eq!(
            session
                .handle_key(7, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::Ignored
        );
    }

    #[test]
    fn restart_returns_robots_to_their_starts() {
        let catalog = test_catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = Session::new(SessionOptions::default());
        session.load_puzzle(2, &catalog, 0).expect("load");
        select(&mut session, RobotColor::Red);
        assert!(session.apply_direction(Direction::Right, 0));
        run_to_rest(&mut session);
        assert_eq!(session.moves(), 1);

        let outcome = session
            .handle_action(
                InputAction::Control(ControlAction::Restart),
                &catalog,
                &mut rng,
                100,
            )
            .expect("catalog lookups succeed");
        assert_eq!(outcome, KeyOutcome::PuzzleLoaded);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.puzzle_id(), Some(2));
        assert_eq!(position_of(&session, RobotColor::Red), Cell::new(2, 2));
        assert_eq!(session.tick_count(), 0);
    }

    #[test]
    fn won_session_continues_with_another_puzzle() {
        let catalog = test_catalog();
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = Session::new(SessionOptions::default());
        session.load_puzzle(2, &catalog, 0).expect("load");
        select(&mut session, RobotColor::Blue);
        assert!(session.apply_direction(Direction::Up, 0));
        run_to_rest(&mut session);
        select(&mut session, RobotColor::Red);
        assert!(session.apply_direction(Direction::Right, 0));
        run_to_rest(&mut session);
        assert_eq!(session.phase(), SessionPhase::Won);
        assert!(!session.apply_direction(Direction::Left, 0));

        assert_eq!(
            session
                .handle_key(KEY_SPACE, &catalog, &mut rng, 0)
                .expect("catalog lookups succeed"),
            KeyOutcome::PuzzleLoaded
        );
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn builtin_first_puzzle_is_won_mid_slide_in_three_moves() {
        let catalog = PuzzleCatalog::builtin().expect("builtin catalog");
        let mut session = Session::new(SessionOptions::default());
        session.load_puzzle(1, &catalog, 0).expect("load");
        select(&mut session, RobotColor::Red);

        for dir in [Direction::Right, Direction::Up, Direction::Left] {
            assert!(session.apply_direction(dir, 0));
            run_to_rest(&mut session);
        }

        assert_eq!(session.phase(), SessionPhase::Won);
        assert_eq!(session.moves(), 3);
        assert_eq!(position_of(&session, RobotColor::Red), Cell::new(2, 1));
    }

    #[test]
    fn puzzle_init_exposes_the_static_layout() {
        let catalog = test_catalog();
        let mut session = Session::new(SessionOptions::default());
        assert!(session.puzzle_init().is_none());
        session.load_puzzle(2, &catalog, 0).expect("load");
        let init = session.puzzle_init().expect("puzzle loaded");
        assert_eq!(init.puzzle_id, 2);
        assert_eq!(init.goal, Cell::new(4, 2));
        assert_eq!(init.walls.len(), 20);
        let value = serde_json::to_value(&init).expect("serialize init");
        assert_eq!(value["goalColor"], "red");
        assert_eq!(value["robots"][1]["tag"], "robot-blue");
    }
}
