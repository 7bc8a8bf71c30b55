use board_2048::board::Direction;
use board_2048::game::Game;
use board_2048::spawn::Spawner;
use rand::seq::SliceRandom;

fn main() {
    let mut rng = rand::thread_rng();
    let mut game = Game::new(4, 4, Spawner::default(), &mut rng);
    println!("{}", game.board());
    let mut move_count = 0;
    while !game.is_over() {
        let dir = *Direction::ALL.choose(&mut rng).unwrap();
        if game.step(dir, &mut rng).is_none() {
            break;
        }
        move_count += 1;
        println!("{}", game.board());
    }
    println!(
        "Moves made: {}, Highest tile: {}, Final tile count: {}",
        move_count,
        game.board().highest_tile(),
        game.board().len()
    )
}
