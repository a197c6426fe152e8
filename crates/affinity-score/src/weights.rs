use affinity_core::Factor;

/// Relative importance of each compatibility factor. Process-wide constant.
pub const WEIGHTS: WeightTable = WeightTable {
    deal_breakers: 4.0,
    gender_preference: 3.0,
    age_compatibility: 2.5,
    personality: 2.2,
    hobbies: 2.0,
    music: 1.8,
    movies: 1.8,
    vacation: 1.6,
    life_goals: 1.8,
    activity: 1.5,
    pet_friendliness: 1.2,
    child_friendliness: 1.2,
    vices: 1.0,
    height: 0.8,
    occupation: 0.6,
    education: 0.5,
};

#[derive(Debug, Clone, Copy)]
pub struct WeightTable {
    pub deal_breakers: f64,
    pub gender_preference: f64,
    pub age_compatibility: f64,
    pub personality: f64,
    pub hobbies: f64,
    pub music: f64,
    pub movies: f64,
    pub vacation: f64,
    pub life_goals: f64,
    pub activity: f64,
    pub pet_friendliness: f64,
    pub child_friendliness: f64,
    pub vices: f64,
    pub height: f64,
    pub occupation: f64,
    pub education: f64,
}

impl WeightTable {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::DealBreakers => self.deal_breakers,
            Factor::GenderPreference => self.gender_preference,
            Factor::AgeCompatibility => self.age_compatibility,
            Factor::Personality => self.personality,
            Factor::Hobbies => self.hobbies,
            Factor::Music => self.music,
            Factor::Movies => self.movies,
            Factor::Vacation => self.vacation,
            Factor::LifeGoals => self.life_goals,
            Factor::Activity => self.activity,
            Factor::PetFriendliness => self.pet_friendliness,
            Factor::ChildFriendliness => self.child_friendliness,
            Factor::Vices => self.vices,
            Factor::Height => self.height,
            Factor::Occupation => self.occupation,
            Factor::Education => self.education,
        }
    }

    pub fn sum(&self) -> f64 {
        Factor::ALL.iter().map(|f| self.get(*f)).sum()
    }
}
