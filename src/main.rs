use topic_duel::rocket_initialize;

#[rocket::launch]
fn rocket() -> _ {
    rocket_initialize()
}
