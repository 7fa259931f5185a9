//! Ledge demo
//!
//! Runs a small headless room: a player hopping across a tiled floor, an
//! elevator that carries whatever stands on it, and a few crates dropped at
//! seeded positions. Positions and contacts go to the log.
//!
//! Usage: `ledge-demo [seed] [settings.json]`

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use ledge::consts::{MAX_SUBSTEPS, SIM_DT};
use ledge::{Body, BodyKey, PhysicsWorld, Settings, Shape, TileMap, Transform};

const TILE: f32 = 16.0;
const GRAVITY: f32 = -600.0;
const WALK_SPEED: f32 = 90.0;
const JUMP_SPEED: f32 = 260.0;
const ELEVATOR_SPEED: f32 = 40.0;
const DEMO_SECONDS: f32 = 6.0;
/// Simulated wall-clock frame, deliberately uneven against `SIM_DT`
const FRAME_DT: f32 = 1.0 / 45.0;

const PLAYER_GROUP: u32 = 0b001;
const CRATE_GROUP: u32 = 0b010;
const PLATFORM_GROUP: u32 = 0b100;

const ROOM: [&str; 8] = [
    "####################",
    "#..................#",
    "#..................#",
    "#..........####....#",
    "#..................#",
    "#.....##...........#",
    "#..................#",
    "####################",
];

/// Gameplay-side state for a falling body
struct Mover {
    key: BodyKey,
    velocity: Vec2,
}

struct Demo {
    world: PhysicsWorld,
    player: Mover,
    crates: Vec<Mover>,
    elevator: BodyKey,
    elevator_dir: f32,
    contacts: Rc<RefCell<u32>>,
    time: f32,
    ticks: u64,
}

impl Demo {
    fn new(seed: u64, settings: Settings) -> ledge::Result<Self> {
        let mut world = PhysicsWorld::new(settings);

        let room = TileMap::from_rows(&ROOM);
        let scale = Vec2::new(room.width() as f32, room.height() as f32) * TILE;
        world.set_edifice_shape(
            Shape::Tilemap(room),
            Transform {
                translate: Vec2::ZERO,
                scale,
            },
        );

        let elevator = world.add_body(
            Body::new(Vec2::new(15.0 * TILE, TILE), Vec2::new(2.0 * TILE, TILE / 2.0))
                .as_solid()
                .as_pusher()
                .with_groups(PLATFORM_GROUP, 0),
        );

        let player_key = world.add_body(
            Body::new(Vec2::new(2.0 * TILE, TILE), Vec2::new(10.0, 14.0))
                .with_groups(PLAYER_GROUP, CRATE_GROUP | PLATFORM_GROUP),
        );
        let contacts = Rc::new(RefCell::new(0_u32));
        {
            let contacts = Rc::clone(&contacts);
            world.set_collision_handler(player_key, move |contact| {
                *contacts.borrow_mut() += 1;
                log::debug!(
                    "Player touched {:?} (group {:#b})",
                    contact.other,
                    contact.other_group
                );
            })?;
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut crates = Vec::new();
        for _ in 0..4 {
            let x = rng.random_range(2.0..16.0) * TILE;
            let y = rng.random_range(4.0..6.0) * TILE;
            let key = world.add_body(
                Body::new(Vec2::new(x, y), Vec2::new(12.0, 12.0))
                    .as_solid()
                    .with_groups(CRATE_GROUP, CRATE_GROUP | PLATFORM_GROUP),
            );
            crates.push(Mover {
                key,
                velocity: Vec2::ZERO,
            });
        }

        log::info!(
            "Room ready: {} bodies, seed {}, {} resolution",
            world.len(),
            seed,
            world.settings().resolution.as_str()
        );

        Ok(Self {
            world,
            player: Mover {
                key: player_key,
                velocity: Vec2::ZERO,
            },
            crates,
            elevator,
            elevator_dir: 1.0,
            contacts,
            time: 0.0,
            ticks: 0,
        })
    }

    /// One fixed simulation step
    fn tick(&mut self, dt: f32) {
        self.time += dt;
        self.ticks += 1;

        // Elevator bounces between the floor and the upper ledge
        let elevator_y = self.world.body(self.elevator).map_or(0.0, |b| b.pos().y);
        if elevator_y > 5.0 * TILE {
            self.elevator_dir = -1.0;
        } else if elevator_y < TILE + 1.0 {
            self.elevator_dir = 1.0;
        }
        let lift = Vec2::new(0.0, self.elevator_dir * ELEVATOR_SPEED * dt);
        if self.world.move_body(self.elevator, lift).was_obstructed() {
            self.elevator_dir = -self.elevator_dir;
        }

        // Player walks right and hops whenever it lands
        let grounded = self.world.is_grounded(self.player.key);
        self.player.velocity.x = WALK_SPEED;
        if grounded {
            self.player.velocity.y = JUMP_SPEED;
        }
        step_mover(&mut self.world, &mut self.player, dt);

        for mover in &mut self.crates {
            step_mover(&mut self.world, mover, dt);
        }

        if self
            .world
            .body(self.player.key)
            .is_some_and(|body| body.crushed)
        {
            log::warn!("Player crushed at t={:.2}s", self.time);
        }

        self.world.check_for_overlaps();
    }

    fn report(&self) {
        for (key, body) in self.world.bodies() {
            log::info!(
                "t={:.2}s {:?} at ({:.1}, {:.1}) ground={:?}",
                self.time,
                key,
                body.pos().x,
                body.pos().y,
                body.ground()
            );
        }
    }
}

/// Integrate gravity, then slide; a blocked axis loses its velocity
fn step_mover(world: &mut PhysicsWorld, mover: &mut Mover, dt: f32) {
    mover.velocity.y += GRAVITY * dt;
    let trace = world.slide_move(mover.key, mover.velocity * dt);
    if !trace.horz {
        mover.velocity.x = 0.0;
    }
    if !trace.vert {
        mover.velocity.y = 0.0;
    }
}

fn main() -> ledge::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(12345);
    let settings = match args.next() {
        Some(path) => Settings::from_json(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };

    log::info!("Ledge demo starting...");
    let mut demo = Demo::new(seed, settings)?;

    // Fixed timestep with an accumulator, as a render loop would drive it
    let mut accumulator = 0.0_f32;
    let mut frames = 0_u32;
    while demo.time < DEMO_SECONDS {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            demo.tick(SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
        frames += 1;
        if frames % 45 == 0 {
            demo.report();
        }
    }

    log::info!(
        "Done: {} ticks, {} player contacts",
        demo.ticks,
        demo.contacts.borrow()
    );
    Ok(())
}
