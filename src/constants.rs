pub const RECIPE_COUNT_PER_PAGE: i64 = 6;

pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const TAG_NAME_MAX_LENGTH: usize = 200;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 200;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 16;
pub const USER_NAME_MAX_LENGTH: usize = 128;
pub const EMAIL_MAX_LENGTH: usize = 256;

pub const TOKEN_PREFIX: &str = "Token ";
pub const TOKEN_LIFETIME_MAX_HOURS: i64 = 24 * 365;

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
